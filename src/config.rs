use crate::{
    error::{KanbanError, Result},
    storage::{MemoryStorage, Storage},
};
use anyhow::{bail, Context};
use std::{path::PathBuf, str::FromStr, sync::Arc};

/// Where snapshots are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    File,
    Memory,
    Sqlite,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => bail!("unknown storage backend '{}' (expected file, memory or sqlite)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    /// Overrides every board's `autoSave` setting when present
    pub autosave_override: Option<bool>,
}

impl Config {
    pub const DATA_DIR_VAR: &'static str = "KANBAN_DATA_DIR";
    pub const STORAGE_VAR: &'static str = "KANBAN_STORAGE";
    pub const AUTOSAVE_VAR: &'static str = "KANBAN_AUTOSAVE";

    pub fn from_env() -> std::result::Result<Self, anyhow::Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> std::result::Result<Self, anyhow::Error> {
        let defaults = Self::default();

        let backend = match lookup(Self::STORAGE_VAR) {
            Some(value) => value
                .parse::<StorageBackend>()
                .with_context(|| format!("invalid {}", Self::STORAGE_VAR))?,
            None => defaults.backend,
        };

        let autosave_override = match lookup(Self::AUTOSAVE_VAR) {
            Some(value) => Some(
                value
                    .trim()
                    .parse::<bool>()
                    .with_context(|| format!("invalid {}: '{}'", Self::AUTOSAVE_VAR, value))?,
            ),
            None => None,
        };

        Ok(Self {
            data_dir: lookup(Self::DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            backend,
            autosave_override,
        })
    }

    /// Builds the configured storage backend
    pub fn open_storage(&self) -> Result<Arc<dyn Storage>> {
        match self.backend {
            StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
            #[cfg(feature = "file-storage")]
            StorageBackend::File => Ok(Arc::new(crate::storage::FileStorage::new(
                &self.data_dir,
            ))),
            #[cfg(feature = "sqlite-storage")]
            StorageBackend::Sqlite => Ok(Arc::new(crate::storage::SqliteStorage::open(
                self.data_dir.join("boards.db"),
            )?)),
            #[allow(unreachable_patterns)]
            other => Err(KanbanError::StorageError(format!(
                "{:?} storage is not enabled in this build",
                other
            ))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".kanban"),
            backend: StorageBackend::File,
            autosave_override: None,
        }
    }
}
