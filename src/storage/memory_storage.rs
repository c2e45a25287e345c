use crate::{
    error::{KanbanError, Result},
    storage::{Snapshot, Storage},
};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Keeps the serialized snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a raw document, as if a previous session had written it
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }

    /// The raw stored document, if any
    pub async fn document(&self) -> Option<String> {
        self.document.lock().await.clone()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let json = snapshot.to_json()?;
        *self.document.lock().await = Some(json);
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Snapshot> {
        let guard = self.document.lock().await;
        let document = guard
            .as_deref()
            .ok_or_else(|| KanbanError::SnapshotMissing("memory".to_string()))?;
        Snapshot::from_json(document)
    }

    async fn is_initialized(&self) -> bool {
        self.document.lock().await.is_some()
    }
}
