use crate::error::Result;
use async_trait::async_trait;

#[cfg(feature = "file-storage")]
pub mod file_storage;
pub mod memory_storage;
pub mod snapshot;

#[cfg(feature = "sqlite-storage")]
pub mod sqlite_storage;

#[cfg(feature = "file-storage")]
pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;
pub use snapshot::Snapshot;

#[cfg(feature = "sqlite-storage")]
pub use sqlite_storage::SqliteStorage;

/// Storage trait for persisting board snapshots
#[async_trait]
pub trait Storage: Send + Sync {
    /// Prepares the backend (directories, tables)
    async fn initialize(&self) -> Result<()>;

    /// Replaces the stored snapshot
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// Loads the stored snapshot.
    ///
    /// Fails with `SnapshotMissing` when nothing was saved yet and with
    /// `SnapshotCorrupt` when the stored document cannot be used.
    async fn load_snapshot(&self) -> Result<Snapshot>;

    /// Checks whether a snapshot has been saved
    async fn is_initialized(&self) -> bool;
}
