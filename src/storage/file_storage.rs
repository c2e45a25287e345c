use crate::{
    error::{KanbanError, Result},
    storage::{Snapshot, Storage},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// File-based storage: one JSON document per data directory
pub struct FileStorage {
    root_path: PathBuf,
}

impl FileStorage {
    const SNAPSHOT_FILE: &'static str = "boards.json";
    const TEMP_FILE: &'static str = "boards.json.tmp";

    /// Creates a new FileStorage rooted at `data_dir`
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root_path: data_dir.as_ref().to_path_buf(),
        }
    }

    pub fn snapshot_file(&self) -> PathBuf {
        self.root_path.join(Self::SNAPSHOT_FILE)
    }

    fn temp_file(&self) -> PathBuf {
        self.root_path.join(Self::TEMP_FILE)
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;

        let json = snapshot.to_json()?;

        // Write aside, then rename over the old document
        fs::write(self.temp_file(), json).await?;
        fs::rename(self.temp_file(), self.snapshot_file()).await?;

        tracing::debug!(path = %self.snapshot_file().display(), "snapshot written");
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Snapshot> {
        let file_path = self.snapshot_file();

        if !file_path.exists() {
            return Err(KanbanError::SnapshotMissing(
                file_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&file_path).await?;
        Snapshot::from_json(&contents)
    }

    async fn is_initialized(&self) -> bool {
        self.snapshot_file().exists()
    }
}
