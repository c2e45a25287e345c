use crate::{
    domain::Board,
    error::{KanbanError, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serialized form of the full board collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "Snapshot::current_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub boards: Vec<Board>,
}

impl Snapshot {
    pub const VERSION: u32 = 1;

    fn current_version() -> u32 {
        Self::VERSION
    }

    /// Captures `boards`, stamped with the current time
    pub fn new(boards: Vec<Board>) -> Self {
        Self {
            version: Self::VERSION,
            saved_at: Some(Utc::now()),
            boards,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and validates a document. Any defect is reported as
    /// `SnapshotCorrupt` so callers can fall back to seed data.
    pub fn from_json(document: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(document)
            .map_err(|e| KanbanError::SnapshotCorrupt(e.to_string()))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    fn validate(&self) -> Result<()> {
        if self.version > Self::VERSION {
            return Err(KanbanError::SnapshotCorrupt(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }

        let mut board_ids = HashSet::new();
        for board in &self.boards {
            if !board_ids.insert(&board.id) {
                return Err(KanbanError::SnapshotCorrupt(format!(
                    "duplicate board id '{}'",
                    board.id
                )));
            }
            let violations = board.invariant_violations();
            if !violations.is_empty() {
                return Err(KanbanError::SnapshotCorrupt(format!(
                    "board '{}': {}",
                    board.id,
                    violations.join("; ")
                )));
            }
        }
        Ok(())
    }
}
