use crate::domain::board::{Board, ColumnId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Card count for one column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCount {
    pub column: ColumnId,
    pub cards: usize,
    pub limit: Option<u32>,
}

/// Read-only summary of a board
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total_cards: usize,
    /// Cards in the terminal (highest `order`) column
    pub done_cards: usize,
    /// Past-due cards outside the terminal column
    pub overdue_cards: usize,
    pub estimated_hours: f64,
    pub actual_hours: f64,
    pub subtasks_completed: usize,
    pub subtasks_total: usize,
    /// Per-column counts in display order
    pub columns: Vec<ColumnCount>,
}

impl BoardStats {
    /// Computes statistics as of `now`
    pub fn compute(board: &Board, now: DateTime<Utc>) -> Self {
        let terminal = board.terminal_column().map(|col| &col.id);
        let is_terminal = |id: &ColumnId| terminal == Some(id);

        let mut stats = Self {
            total_cards: 0,
            done_cards: 0,
            overdue_cards: 0,
            estimated_hours: 0.0,
            actual_hours: 0.0,
            subtasks_completed: 0,
            subtasks_total: 0,
            columns: Vec::with_capacity(board.columns.len()),
        };

        for col in board.columns_in_order() {
            let done_column = is_terminal(&col.id);
            stats.columns.push(ColumnCount {
                column: col.id.clone(),
                cards: col.cards.len(),
                limit: col.limit,
            });

            for card in &col.cards {
                stats.total_cards += 1;
                if done_column {
                    stats.done_cards += 1;
                } else if card.is_past_due(now) {
                    stats.overdue_cards += 1;
                }
                stats.estimated_hours += card.estimated_hours.unwrap_or(0.0);
                stats.actual_hours += card.actual_hours.unwrap_or(0.0);
                let (completed, total) = card.subtask_progress();
                stats.subtasks_completed += completed;
                stats.subtasks_total += total;
            }
        }

        stats
    }

    /// Share of cards in the terminal column, 0.0 for an empty board
    pub fn completion_ratio(&self) -> f64 {
        if self.total_cards == 0 {
            0.0
        } else {
            self.done_cards as f64 / self.total_cards as f64
        }
    }
}
