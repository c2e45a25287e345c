//! # Kanban Core
//!
//! Board and card state engine for kanban boards.
//!
//! This crate owns the rules for creating, editing and moving cards between
//! columns, enforces work-in-progress limits on moves, computes filtered
//! views and statistics, and persists boards as JSON snapshots. It has no
//! knowledge of any UI: a rendering layer issues commands to a
//! [`BoardStore`] and redraws from the state it returns.

pub mod config;
pub mod domain;
pub mod error;
pub mod seed;
pub mod storage;
pub mod store;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use domain::{
    board::{Board, BoardId, BoardSettings, Column, ColumnId, Label, User},
    card::{Card, CardId, CardPatch, NewCard, Priority, Subtask},
    filter::CardFilters,
    stats::BoardStats,
};
pub use error::{ErrorKind, KanbanError, Result};
pub use storage::{Snapshot, Storage};
pub use store::{BoardStore, LoadOutcome, SharedBoardStore};
