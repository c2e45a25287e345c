//! The board store: sole owner and mutator of board state.
//!
//! Every mutation either applies completely or leaves the board exactly as
//! it was. After a successful mutation the store saves a snapshot when the
//! board has `autoSave` enabled.

use crate::{
    config::Config,
    domain::{
        apply_filters, column_view, Board, BoardId, BoardStats, Card, CardFilters, CardId,
        CardPatch, ColumnId, NewCard,
    },
    error::{KanbanError, Result},
    seed,
    storage::{Snapshot, Storage},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod shared;

pub use shared::SharedBoardStore;

/// How the store obtained its boards at startup
#[derive(Debug)]
pub enum LoadOutcome {
    /// Boards were read from the saved snapshot
    Restored,
    /// The snapshot was unusable; seed boards were installed instead
    Seeded { reason: KanbanError },
}

impl LoadOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, Self::Restored)
    }
}

pub struct BoardStore {
    boards: Vec<Board>,
    storage: Arc<dyn Storage>,
    autosave_override: Option<bool>,
    last_save_error: Option<KanbanError>,
}

impl BoardStore {
    /// Creates a store over `boards` without touching storage
    pub fn new(boards: Vec<Board>, storage: Arc<dyn Storage>) -> Self {
        Self {
            boards,
            storage,
            autosave_override: None,
            last_save_error: None,
        }
    }

    /// Forces autosave on or off for every board, ignoring board settings
    pub fn with_autosave_override(mut self, autosave: Option<bool>) -> Self {
        self.autosave_override = autosave;
        self
    }

    /// Loads the saved snapshot, falling back to the seed boards when it is
    /// missing or unusable
    pub async fn open(storage: Arc<dyn Storage>) -> (Self, LoadOutcome) {
        let mut store = Self::new(Vec::new(), storage);
        let outcome = store.reload().await;
        (store, outcome)
    }

    /// Opens the storage described by `config` and loads from it
    pub async fn open_with_config(config: &Config) -> Result<(Self, LoadOutcome)> {
        let storage = config.open_storage()?;
        storage.initialize().await?;
        let (store, outcome) = Self::open(storage).await;
        Ok((store.with_autosave_override(config.autosave_override), outcome))
    }

    /// Replaces in-memory state with the saved snapshot or, failing that,
    /// with the seed boards
    pub async fn reload(&mut self) -> LoadOutcome {
        match self.storage.load_snapshot().await {
            Ok(snapshot) => {
                info!(boards = snapshot.boards.len(), "restored boards from snapshot");
                self.boards = snapshot.boards;
                LoadOutcome::Restored
            }
            Err(reason) => {
                warn!(error = %reason, "snapshot unavailable, using seed boards");
                self.boards = seed::default_boards();
                LoadOutcome::Seeded { reason }
            }
        }
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board(&self, board_id: &BoardId) -> Result<&Board> {
        self.boards
            .iter()
            .find(|b| &b.id == board_id)
            .ok_or_else(|| KanbanError::BoardNotFound(board_id.to_string()))
    }

    fn board_mut(&mut self, board_id: &BoardId) -> Result<&mut Board> {
        self.boards
            .iter_mut()
            .find(|b| &b.id == board_id)
            .ok_or_else(|| KanbanError::BoardNotFound(board_id.to_string()))
    }

    /// Creates a card at the end of `column_id`.
    ///
    /// Column limits are only checked here when the board has
    /// `strictWipLimits` set.
    pub async fn add_card(
        &mut self,
        board_id: &BoardId,
        column_id: &ColumnId,
        new_card: NewCard,
    ) -> Result<Card> {
        new_card.validate()?;
        let board = self.board_mut(board_id)?;
        let col_idx = board
            .column_index(column_id)
            .ok_or_else(|| KanbanError::ColumnNotFound(column_id.to_string()))?;
        board.check_references(&new_card.assignees, &new_card.labels)?;
        if board.settings.strict_wip_limits {
            board.columns[col_idx].ensure_capacity()?;
        }

        let card = new_card.into_card(CardId::generate(), column_id.clone());
        board.columns[col_idx].cards.push(card.clone());

        debug!(board = %board_id, card = %card.id, column = %column_id, "card added");
        self.autosave(board_id).await;
        Ok(card)
    }

    /// Merges `patch` into a card. The card's column never changes here.
    pub async fn update_card(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        patch: CardPatch,
    ) -> Result<Card> {
        patch.validate()?;
        let board = self.board_mut(board_id)?;
        if board.card(card_id).is_none() {
            return Err(KanbanError::CardNotFound(card_id.to_string()));
        }
        board.check_references(
            patch.assignees.as_ref().unwrap_or(&Default::default()),
            patch.labels.as_ref().unwrap_or(&Default::default()),
        )?;

        let card = board
            .card_mut(card_id)
            .ok_or_else(|| KanbanError::CardNotFound(card_id.to_string()))?;
        patch.apply_to(card);
        let updated = card.clone();

        debug!(board = %board_id, card = %card_id, "card updated");
        self.autosave(board_id).await;
        Ok(updated)
    }

    /// Permanently removes a card, returning it
    pub async fn delete_card(&mut self, board_id: &BoardId, card_id: &CardId) -> Result<Card> {
        let board = self.board_mut(board_id)?;
        let (col_idx, card_idx) = board
            .locate_card(card_id)
            .ok_or_else(|| KanbanError::CardNotFound(card_id.to_string()))?;
        let removed = board.columns[col_idx].cards.remove(card_idx);

        debug!(board = %board_id, card = %card_id, "card deleted");
        self.autosave(board_id).await;
        Ok(removed)
    }

    /// Moves a card to the end of `target`.
    ///
    /// Moving a card to the column that already holds it is a no-op and
    /// skips the limit check. A full target column refuses the move and the
    /// card stays where it was.
    pub async fn move_card(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        target: &ColumnId,
    ) -> Result<Card> {
        let board = self.board_mut(board_id)?;
        let (src_idx, card_idx) = board
            .locate_card(card_id)
            .ok_or_else(|| KanbanError::CardNotFound(card_id.to_string()))?;

        if &board.columns[src_idx].id == target {
            return Ok(board.columns[src_idx].cards[card_idx].clone());
        }

        let dst_idx = board
            .column_index(target)
            .ok_or_else(|| KanbanError::ColumnNotFound(target.to_string()))?;
        if let Err(err) = board.columns[dst_idx].ensure_capacity() {
            warn!(board = %board_id, card = %card_id, column = %target, "move refused: {}", err);
            return Err(err);
        }

        let mut card = board.columns[src_idx].cards.remove(card_idx);
        card.status = target.clone();
        card.updated_at = Utc::now();
        board.columns[dst_idx].cards.push(card.clone());

        debug!(board = %board_id, card = %card_id, column = %target, "card moved");
        self.autosave(board_id).await;
        Ok(card)
    }

    /// Appends a subtask to a card
    pub async fn add_subtask(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        title: impl Into<String>,
    ) -> Result<Card> {
        let title = title.into();
        self.edit_card(board_id, card_id, |card| card.add_subtask(title).map(|_| ()))
            .await
    }

    pub async fn toggle_subtask(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        subtask_id: &str,
    ) -> Result<Card> {
        self.edit_card(board_id, card_id, |card| {
            card.toggle_subtask(subtask_id).map(|_| ())
        })
        .await
    }

    pub async fn remove_subtask(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        subtask_id: &str,
    ) -> Result<Card> {
        self.edit_card(board_id, card_id, |card| {
            card.remove_subtask(subtask_id).map(|_| ())
        })
        .await
    }

    async fn edit_card(
        &mut self,
        board_id: &BoardId,
        card_id: &CardId,
        edit: impl FnOnce(&mut Card) -> Result<()>,
    ) -> Result<Card> {
        let card = self
            .board_mut(board_id)?
            .card_mut(card_id)
            .ok_or_else(|| KanbanError::CardNotFound(card_id.to_string()))?;
        edit(card)?;
        let edited = card.clone();

        debug!(board = %board_id, card = %card_id, "card edited");
        self.autosave(board_id).await;
        Ok(edited)
    }

    pub fn stats(&self, board_id: &BoardId) -> Result<BoardStats> {
        Ok(BoardStats::compute(self.board(board_id)?, Utc::now()))
    }

    pub fn apply_filters(&self, board_id: &BoardId, filters: &CardFilters) -> Result<Vec<&Card>> {
        Ok(apply_filters(self.board(board_id)?, filters))
    }

    pub fn column_view(
        &self,
        board_id: &BoardId,
        filters: &CardFilters,
        column_id: &ColumnId,
    ) -> Result<Vec<&Card>> {
        let board = self.board(board_id)?;
        if board.column(column_id).is_none() {
            return Err(KanbanError::ColumnNotFound(column_id.to_string()));
        }
        Ok(column_view(board, filters, column_id))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.boards.clone())
    }

    /// Writes all boards to storage
    pub async fn save(&self) -> Result<()> {
        self.storage.save_snapshot(&self.snapshot()).await?;
        info!(boards = self.boards.len(), "saved snapshot");
        Ok(())
    }

    /// Returns and clears the most recent autosave failure
    pub fn take_save_error(&mut self) -> Option<KanbanError> {
        self.last_save_error.take()
    }

    fn autosave_enabled(&self, board_id: &BoardId) -> bool {
        self.autosave_override.unwrap_or_else(|| {
            self.board(board_id)
                .map(|b| b.settings.auto_save)
                .unwrap_or(false)
        })
    }

    async fn autosave(&mut self, board_id: &BoardId) {
        if !self.autosave_enabled(board_id) {
            return;
        }
        if let Err(err) = self.save().await {
            warn!(board = %board_id, error = %err, "autosave failed");
            self.last_save_error = Some(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{BoardSettings, Column, Priority},
        error::ErrorKind,
        storage::MemoryStorage,
    };
    use async_trait::async_trait;

    struct FailingStorage;

    #[async_trait]
    impl Storage for FailingStorage {
        async fn initialize(&self) -> Result<()> {
            Ok(())
        }

        async fn save_snapshot(&self, _snapshot: &Snapshot) -> Result<()> {
            Err(KanbanError::StorageError("disk full".to_string()))
        }

        async fn load_snapshot(&self) -> Result<Snapshot> {
            Err(KanbanError::SnapshotMissing("nowhere".to_string()))
        }

        async fn is_initialized(&self) -> bool {
            false
        }
    }

    fn board_id() -> BoardId {
        BoardId::from("b")
    }

    fn col(id: &str) -> ColumnId {
        ColumnId::from(id)
    }

    fn board(settings: BoardSettings) -> Board {
        Board::new("b", "Test")
            .with_column(Column::new("todo", "To Do", 0))
            .with_column(Column::new("doing", "Doing", 1).with_limit(2))
            .with_column(Column::new("done", "Done", 2))
            .with_user(crate::domain::User::new("ada", "Ada"))
            .with_label(crate::domain::Label::new("bug", "Bug", "#f00"))
            .with_settings(settings)
    }

    fn store_with(settings: BoardSettings) -> (BoardStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let store = BoardStore::new(vec![board(settings)], storage.clone());
        (store, storage)
    }

    fn store() -> BoardStore {
        store_with(BoardSettings {
            auto_save: false,
            ..BoardSettings::default()
        })
        .0
    }

    #[tokio::test]
    async fn test_add_card() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("Write spec"))
            .await
            .unwrap();

        assert_eq!(card.status, col("todo"));
        assert_eq!(card.created_at, card.updated_at);
        let board = store.board(&board_id()).unwrap();
        assert_eq!(board.columns[0].cards.len(), 1);
        assert_eq!(board.columns[0].cards[0].id, card.id);
    }

    #[tokio::test]
    async fn test_add_card_validation_and_lookup_errors() {
        let mut store = store();
        let before = store.boards().to_vec();

        let err = store
            .add_card(&board_id(), &col("todo"), NewCard::new("  "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = store
            .add_card(&board_id(), &col("nope"), NewCard::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::ColumnNotFound(_)));

        let err = store
            .add_card(&BoardId::from("other"), &col("todo"), NewCard::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::BoardNotFound(_)));

        let err = store
            .add_card(
                &board_id(),
                &col("todo"),
                NewCard::new("x").with_assignee("ghost"),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(store.boards(), before.as_slice());
    }

    #[tokio::test]
    async fn test_add_card_ignores_limit_unless_strict() {
        let mut store = store();
        for i in 0..3 {
            store
                .add_card(&board_id(), &col("doing"), NewCard::new(format!("c{}", i)))
                .await
                .unwrap();
        }
        let doing = store.board(&board_id()).unwrap().column(&col("doing")).unwrap();
        assert_eq!(doing.cards.len(), 3);
        assert!(doing.is_over_limit());

        let mut strict = store_with(BoardSettings {
            auto_save: false,
            strict_wip_limits: true,
            ..BoardSettings::default()
        })
        .0;
        for i in 0..2 {
            strict
                .add_card(&board_id(), &col("doing"), NewCard::new(format!("c{}", i)))
                .await
                .unwrap();
        }
        let err = strict
            .add_card(&board_id(), &col("doing"), NewCard::new("c2"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WipLimitExceeded);
    }

    #[tokio::test]
    async fn test_update_card() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("Old"))
            .await
            .unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let patch = CardPatch {
            title: Some("New".to_string()),
            priority: Some(Priority::Highest),
            assignees: Some(["ada".to_string()].into()),
            ..CardPatch::default()
        };
        let updated = store
            .update_card(&board_id(), &card.id, patch)
            .await
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.priority, Priority::Highest);
        assert_eq!(updated.status, col("todo"));
        assert!(updated.updated_at > card.updated_at);
        assert_eq!(updated.created_at, card.created_at);
    }

    #[tokio::test]
    async fn test_update_card_errors_leave_card_unchanged() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("Keep"))
            .await
            .unwrap();

        let err = store
            .update_card(&board_id(), &CardId::from("missing"), CardPatch::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let patch = CardPatch {
            title: Some("Changed".to_string()),
            labels: Some(["unknown".to_string()].into()),
            ..CardPatch::default()
        };
        assert!(store.update_card(&board_id(), &card.id, patch).await.is_err());

        let board = store.board(&board_id()).unwrap();
        assert_eq!(board.card(&card.id), Some(&card));
    }

    #[tokio::test]
    async fn test_delete_card() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("Temp"))
            .await
            .unwrap();

        let removed = store.delete_card(&board_id(), &card.id).await.unwrap();
        assert_eq!(removed.id, card.id);
        assert_eq!(store.board(&board_id()).unwrap().card_count(), 0);

        let err = store.delete_card(&board_id(), &card.id).await.unwrap_err();
        assert!(matches!(err, KanbanError::CardNotFound(_)));
    }

    #[tokio::test]
    async fn test_move_card() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("Move me"))
            .await
            .unwrap();

        let moved = store
            .move_card(&board_id(), &card.id, &col("done"))
            .await
            .unwrap();
        assert_eq!(moved.status, col("done"));

        let board = store.board(&board_id()).unwrap();
        assert!(board.column(&col("todo")).unwrap().cards.is_empty());
        assert_eq!(board.column(&col("done")).unwrap().cards[0].id, card.id);
        assert!(board.invariant_violations().is_empty());
    }

    #[tokio::test]
    async fn test_move_to_same_column_is_noop() {
        let mut store = store();
        for i in 0..3 {
            store
                .add_card(&board_id(), &col("doing"), NewCard::new(format!("c{}", i)))
                .await
                .unwrap();
        }
        let before = store.boards().to_vec();
        let id = before[0].columns[1].cards[0].id.clone();

        // Over limit, but a same-column move performs no check
        store.move_card(&board_id(), &id, &col("doing")).await.unwrap();
        assert_eq!(store.boards(), before.as_slice());
    }

    #[tokio::test]
    async fn test_move_into_full_column_is_refused() {
        let mut store = store();
        for i in 0..2 {
            let card = store
                .add_card(&board_id(), &col("todo"), NewCard::new(format!("c{}", i)))
                .await
                .unwrap();
            store.move_card(&board_id(), &card.id, &col("doing")).await.unwrap();
        }
        let extra = store
            .add_card(&board_id(), &col("todo"), NewCard::new("extra"))
            .await
            .unwrap();
        let before = store.boards().to_vec();

        let err = store
            .move_card(&board_id(), &extra.id, &col("doing"))
            .await
            .unwrap_err();
        assert!(matches!(err, KanbanError::WipLimitExceeded { limit: 2, .. }));
        assert_eq!(store.boards(), before.as_slice());
    }

    #[tokio::test]
    async fn test_move_errors() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("x"))
            .await
            .unwrap();

        assert!(matches!(
            store.move_card(&board_id(), &CardId::from("nope"), &col("done")).await,
            Err(KanbanError::CardNotFound(_))
        ));
        assert!(matches!(
            store.move_card(&board_id(), &card.id, &col("nope")).await,
            Err(KanbanError::ColumnNotFound(_))
        ));
        assert_eq!(
            store.board(&board_id()).unwrap().card(&card.id).unwrap().status,
            col("todo")
        );
    }

    #[tokio::test]
    async fn test_subtask_edits() {
        let mut store = store();
        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("x"))
            .await
            .unwrap();

        let card = store.add_subtask(&board_id(), &card.id, "step").await.unwrap();
        let subtask_id = card.subtasks[0].id.clone();

        let card = store
            .toggle_subtask(&board_id(), &card.id, &subtask_id)
            .await
            .unwrap();
        assert!(card.subtasks[0].completed);

        let card = store
            .remove_subtask(&board_id(), &card.id, &subtask_id)
            .await
            .unwrap();
        assert!(card.subtasks.is_empty());

        assert!(matches!(
            store.toggle_subtask(&board_id(), &card.id, &subtask_id).await,
            Err(KanbanError::SubtaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_filtered_views() {
        let mut store = store();
        store
            .add_card(&board_id(), &col("todo"), NewCard::new("Auth flow"))
            .await
            .unwrap();
        store
            .add_card(&board_id(), &col("done"), NewCard::new("OAuth docs"))
            .await
            .unwrap();
        store
            .add_card(&board_id(), &col("done"), NewCard::new("Deploy"))
            .await
            .unwrap();

        let filters = CardFilters::search("auth");
        assert_eq!(store.apply_filters(&board_id(), &filters).unwrap().len(), 2);
        assert_eq!(
            store
                .column_view(&board_id(), &filters, &col("done"))
                .unwrap()
                .len(),
            1
        );
        assert!(store
            .column_view(&board_id(), &filters, &col("nope"))
            .is_err());

        let stats = store.stats(&board_id()).unwrap();
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.done_cards, 2);
    }

    #[tokio::test]
    async fn test_autosave_writes_snapshot() {
        let (mut store, storage) = store_with(BoardSettings::default());
        assert!(storage.document().await.is_none());

        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("saved"))
            .await
            .unwrap();

        let saved = storage.load_snapshot().await.unwrap();
        assert!(saved.boards[0].card(&card.id).is_some());
    }

    #[tokio::test]
    async fn test_no_autosave_when_disabled_or_failed() {
        let (mut store, storage) = store_with(BoardSettings {
            auto_save: false,
            ..BoardSettings::default()
        });
        store
            .add_card(&board_id(), &col("todo"), NewCard::new("unsaved"))
            .await
            .unwrap();
        assert!(storage.document().await.is_none());

        store.save().await.unwrap();
        assert!(storage.document().await.is_some());

        let (mut store, storage) = store_with(BoardSettings::default());
        store = store.with_autosave_override(Some(false));
        store
            .add_card(&board_id(), &col("todo"), NewCard::new("unsaved"))
            .await
            .unwrap();
        assert!(storage.document().await.is_none());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_mutation() {
        let mut store = BoardStore::new(
            vec![board(BoardSettings::default())],
            Arc::new(FailingStorage),
        );

        let card = store
            .add_card(&board_id(), &col("todo"), NewCard::new("kept"))
            .await
            .unwrap();

        assert!(store.board(&board_id()).unwrap().card(&card.id).is_some());
        let err = store.take_save_error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(store.take_save_error().is_none());
    }

    #[tokio::test]
    async fn test_open_falls_back_to_seed() {
        let (store, outcome) = BoardStore::open(Arc::new(FailingStorage)).await;
        assert!(matches!(
            outcome,
            LoadOutcome::Seeded {
                reason: KanbanError::SnapshotMissing(_)
            }
        ));
        let ids: Vec<&BoardId> = store.boards().iter().map(|b| &b.id).collect();
        assert_eq!(ids, vec![&BoardId::from(seed::DEFAULT_BOARD_ID)]);
        assert_eq!(store.board(ids[0]).unwrap().card_count(), 5);
    }

    #[tokio::test]
    async fn test_open_with_memory_config() {
        let config = Config {
            backend: crate::config::StorageBackend::Memory,
            autosave_override: Some(false),
            ..Config::default()
        };
        let (store, outcome) = BoardStore::open_with_config(&config).await.unwrap();
        assert!(!outcome.is_restored());
        assert!(!store.autosave_enabled(&BoardId::from(seed::DEFAULT_BOARD_ID)));
    }

    #[cfg(feature = "sqlite-storage")]
    #[tokio::test]
    async fn test_open_sqlite_config_in_fresh_data_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().join("fresh"),
            backend: crate::config::StorageBackend::Sqlite,
            autosave_override: None,
        };

        let (mut store, outcome) = BoardStore::open_with_config(&config).await.unwrap();
        assert!(matches!(
            outcome,
            LoadOutcome::Seeded {
                reason: KanbanError::SnapshotMissing(_)
            }
        ));
        assert!(config.data_dir.join("boards.db").is_file());

        let main = BoardId::from(seed::DEFAULT_BOARD_ID);
        store
            .add_card(&main, &ColumnId::from("todo"), NewCard::new("Persisted"))
            .await
            .unwrap();
        assert!(store.take_save_error().is_none());

        let (reopened, outcome) = BoardStore::open_with_config(&config).await.unwrap();
        assert!(outcome.is_restored());
        assert_eq!(reopened.boards(), store.boards());
    }
}
