use crate::{
    domain::{Board, BoardId, BoardStats, Card, CardFilters, CardId, CardPatch, ColumnId, NewCard},
    error::{KanbanError, Result},
    store::BoardStore,
};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard};

/// A `BoardStore` shared between tasks.
///
/// Mutations take the write lock, so two moves can never both pass the
/// limit check before either commits. Reads share the read lock and see a
/// consistent board.
#[derive(Clone)]
pub struct SharedBoardStore {
    inner: Arc<RwLock<BoardStore>>,
}

impl SharedBoardStore {
    pub fn new(store: BoardStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Holds the read lock for several reads against one consistent state
    pub async fn read(&self) -> RwLockReadGuard<'_, BoardStore> {
        self.inner.read().await
    }

    pub async fn add_card(
        &self,
        board_id: &BoardId,
        column_id: &ColumnId,
        new_card: NewCard,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .add_card(board_id, column_id, new_card)
            .await
    }

    pub async fn update_card(
        &self,
        board_id: &BoardId,
        card_id: &CardId,
        patch: CardPatch,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .update_card(board_id, card_id, patch)
            .await
    }

    pub async fn delete_card(&self, board_id: &BoardId, card_id: &CardId) -> Result<Card> {
        self.inner.write().await.delete_card(board_id, card_id).await
    }

    pub async fn move_card(
        &self,
        board_id: &BoardId,
        card_id: &CardId,
        target: &ColumnId,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .move_card(board_id, card_id, target)
            .await
    }

    pub async fn add_subtask(
        &self,
        board_id: &BoardId,
        card_id: &CardId,
        title: impl Into<String>,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .add_subtask(board_id, card_id, title)
            .await
    }

    pub async fn toggle_subtask(
        &self,
        board_id: &BoardId,
        card_id: &CardId,
        subtask_id: &str,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .toggle_subtask(board_id, card_id, subtask_id)
            .await
    }

    pub async fn remove_subtask(
        &self,
        board_id: &BoardId,
        card_id: &CardId,
        subtask_id: &str,
    ) -> Result<Card> {
        self.inner
            .write()
            .await
            .remove_subtask(board_id, card_id, subtask_id)
            .await
    }

    pub async fn board(&self, board_id: &BoardId) -> Result<Board> {
        self.inner.read().await.board(board_id).cloned()
    }

    pub async fn stats(&self, board_id: &BoardId) -> Result<BoardStats> {
        self.inner.read().await.stats(board_id)
    }

    pub async fn apply_filters(
        &self,
        board_id: &BoardId,
        filters: &CardFilters,
    ) -> Result<Vec<Card>> {
        let store = self.inner.read().await;
        let cards = store.apply_filters(board_id, filters)?;
        Ok(cards.into_iter().cloned().collect())
    }

    pub async fn column_view(
        &self,
        board_id: &BoardId,
        filters: &CardFilters,
        column_id: &ColumnId,
    ) -> Result<Vec<Card>> {
        let store = self.inner.read().await;
        let cards = store.column_view(board_id, filters, column_id)?;
        Ok(cards.into_iter().cloned().collect())
    }

    pub async fn save(&self) -> Result<()> {
        self.inner.read().await.save().await
    }

    pub async fn take_save_error(&self) -> Option<KanbanError> {
        self.inner.write().await.take_save_error()
    }
}
