use crate::{
    error::{KanbanError, Result},
    storage::{Snapshot, Storage},
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::{path::Path, sync::Mutex};

/// SQLite-based storage holding the snapshot document in a single row
pub struct SqliteStorage {
    connection: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `database_path`, creating missing
    /// parent directories
    pub fn open(database_path: impl AsRef<Path>) -> Result<Self> {
        let database_path = database_path.as_ref();
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let connection = Connection::open(database_path)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let connection = Connection::open_in_memory()?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .connection
            .lock()
            .map_err(|_| KanbanError::StorageError("sqlite connection lock poisoned".into()))?;
        f(&conn)
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn initialize(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS snapshots (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    document TEXT NOT NULL,
                    saved_at TEXT NOT NULL
                )",
                [],
            )?;
            Ok(())
        })
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        self.initialize().await?;
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO snapshots (id, document, saved_at) VALUES (1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET document = excluded.document, saved_at = excluded.saved_at",
                params![json, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
    }

    async fn load_snapshot(&self) -> Result<Snapshot> {
        if !self.is_initialized().await {
            return Err(KanbanError::SnapshotMissing("sqlite".to_string()));
        }
        let document: Option<String> = self.with_connection(|conn| {
            Ok(conn
                .query_row("SELECT document FROM snapshots WHERE id = 1", [], |row| {
                    row.get::<_, String>(0)
                })
                .optional()?)
        })?;

        match document {
            Some(doc) => Snapshot::from_json(&doc),
            None => Err(KanbanError::SnapshotMissing("sqlite".to_string())),
        }
    }

    async fn is_initialized(&self) -> bool {
        self.with_connection(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'snapshots'",
                [],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
        .unwrap_or(false)
    }
}
