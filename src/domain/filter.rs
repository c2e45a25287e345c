//! Display filtering over a board's cards.
//!
//! Filters produce views only. WIP accounting always uses the columns' real
//! card lists, so a hidden card still takes up capacity.

use crate::domain::{
    board::{Board, ColumnId},
    card::{Card, Priority},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Active filter dimensions. Dimensions combine with AND; values inside one
/// dimension combine with OR. Empty values impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardFilters {
    /// Case-insensitive substring of title or description
    pub search: String,
    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub priority: BTreeSet<Priority>,
}

impl CardFilters {
    pub fn search(query: impl Into<String>) -> Self {
        Self {
            search: query.into(),
            ..Self::default()
        }
    }

    pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
        self.assignees.insert(user_id.into());
        self
    }

    pub fn with_label(mut self, label_id: impl Into<String>) -> Self {
        self.labels.insert(label_id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority.insert(priority);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.assignees.is_empty()
            && self.labels.is_empty()
            && self.priority.is_empty()
    }

    pub fn matches(&self, card: &Card) -> bool {
        self.matches_search(card)
            && any_shared(&self.assignees, &card.assignees)
            && any_shared(&self.labels, &card.labels)
            && (self.priority.is_empty() || self.priority.contains(&card.priority))
    }

    fn matches_search(&self, card: &Card) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let query = self.search.to_lowercase();
        card.title.to_lowercase().contains(&query)
            || card.description.to_lowercase().contains(&query)
    }
}

fn any_shared(wanted: &BTreeSet<String>, present: &BTreeSet<String>) -> bool {
    wanted.is_empty() || !wanted.is_disjoint(present)
}

/// Every card on the board matching `filters`, in column storage order
pub fn apply_filters<'a>(board: &'a Board, filters: &CardFilters) -> Vec<&'a Card> {
    board.cards().filter(|card| filters.matches(card)).collect()
}

/// The filtered cards a single column should display
pub fn column_view<'a>(
    board: &'a Board,
    filters: &CardFilters,
    column_id: &ColumnId,
) -> Vec<&'a Card> {
    apply_filters(board, filters)
        .into_iter()
        .filter(|card| &card.status == column_id)
        .collect()
}
