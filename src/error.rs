use thiserror::Error;

pub type Result<T> = std::result::Result<T, KanbanError>;

/// Coarse classification of failures, used by callers to decide how to recover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    WipLimitExceeded,
    Persistence,
}

#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Subtask not found: {0}")]
    SubtaskNotFound(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Column '{column}' is at its WIP limit of {limit}")]
    WipLimitExceeded { column: String, limit: u32 },

    #[error("No snapshot found: {0}")]
    SnapshotMissing(String),

    #[error("Snapshot is corrupt: {0}")]
    SnapshotCorrupt(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "sqlite-storage")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
}

impl KanbanError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BoardNotFound(_)
            | Self::ColumnNotFound(_)
            | Self::CardNotFound(_)
            | Self::SubtaskNotFound(_) => ErrorKind::NotFound,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::WipLimitExceeded { .. } => ErrorKind::WipLimitExceeded,
            Self::SnapshotMissing(_)
            | Self::SnapshotCorrupt(_)
            | Self::StorageError(_)
            | Self::IoError(_)
            | Self::SerializationError(_) => ErrorKind::Persistence,
            #[cfg(feature = "sqlite-storage")]
            Self::SqliteError(_) => ErrorKind::Persistence,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
