use crate::{
    domain::card::{Card, CardId},
    error::{KanbanError, Result},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

string_id!(
    /// Identifier of a board
    BoardId
);

string_id!(
    /// Identifier of a column, unique within its board
    ColumnId
);

/// A person who can be assigned to cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: None,
        }
    }
}

/// A tag that can be attached to cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Label {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Per-board behavior and display toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSettings {
    /// Save a snapshot after every successful mutation
    pub auto_save: bool,
    pub show_card_count: bool,
    pub show_wip_limits: bool,
    pub compact_view: bool,
    /// Also hold card creation to column limits. Moves are always checked.
    pub strict_wip_limits: bool,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            show_card_count: true,
            show_wip_limits: true,
            compact_view: false,
            strict_wip_limits: false,
        }
    }
}

/// A workflow stage holding an ordered list of cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub color: String,
    /// WIP cap; `None` means unbounded
    pub limit: Option<u32>,
    pub order: i32,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>, order: i32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            color: "#6b7280".to_string(),
            limit: None,
            order,
            cards: Vec::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// True when the column cannot accept another card
    pub fn is_at_limit(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.cards.len() >= limit as usize)
    }

    /// Free slots left under the limit, `None` when unbounded
    pub fn remaining_capacity(&self) -> Option<usize> {
        self.limit
            .map(|limit| (limit as usize).saturating_sub(self.cards.len()))
    }

    pub fn is_over_limit(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.cards.len() > limit as usize)
    }

    /// Fails with `WipLimitExceeded` if one more card would not fit
    pub fn ensure_capacity(&self) -> Result<()> {
        match self.limit {
            Some(limit) if self.cards.len() >= limit as usize => {
                Err(KanbanError::WipLimitExceeded {
                    column: self.id.to_string(),
                    limit,
                })
            }
            _ => Ok(()),
        }
    }
}

/// A kanban board: columns, the cards they hold, and the people and labels cards refer to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub settings: BoardSettings,
    pub columns: Vec<Column>,
}

impl Board {
    pub fn new(id: impl Into<BoardId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            users: Vec::new(),
            labels: Vec::new(),
            settings: BoardSettings::default(),
            columns: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_settings(mut self, settings: BoardSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|col| &col.id == id)
    }

    pub(crate) fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|col| &col.id == id)
    }

    /// Columns sorted by their display `order`
    pub fn columns_in_order(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|col| col.order);
        columns
    }

    /// The last column in display order; cards there count as finished
    pub fn terminal_column(&self) -> Option<&Column> {
        self.columns.iter().max_by_key(|col| col.order)
    }

    /// Finds (column index, position in column) of a card
    pub(crate) fn locate_card(&self, id: &CardId) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col_idx, col)| {
            col.cards
                .iter()
                .position(|card| &card.id == id)
                .map(|card_idx| (col_idx, card_idx))
        })
    }

    pub fn card(&self, id: &CardId) -> Option<&Card> {
        self.locate_card(id)
            .map(|(col_idx, card_idx)| &self.columns[col_idx].cards[card_idx])
    }

    pub(crate) fn card_mut(&mut self, id: &CardId) -> Option<&mut Card> {
        let (col_idx, card_idx) = self.locate_card(id)?;
        Some(&mut self.columns[col_idx].cards[card_idx])
    }

    /// All cards, column by column in storage order
    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.columns.iter().flat_map(|col| col.cards.iter())
    }

    pub fn card_count(&self) -> usize {
        self.columns.iter().map(|col| col.cards.len()).sum()
    }

    /// Ensures every assignee and label id names a user or label on this board
    pub fn check_references(
        &self,
        assignees: &BTreeSet<String>,
        labels: &BTreeSet<String>,
    ) -> Result<()> {
        if let Some(unknown) = assignees
            .iter()
            .find(|id| !self.users.iter().any(|u| &u.id == *id))
        {
            return Err(KanbanError::validation(
                "assignees",
                format!("unknown user '{}'", unknown),
            ));
        }
        if let Some(unknown) = labels
            .iter()
            .find(|id| !self.labels.iter().any(|l| &l.id == *id))
        {
            return Err(KanbanError::validation(
                "labels",
                format!("unknown label '{}'", unknown),
            ));
        }
        Ok(())
    }

    /// Lists structural violations: duplicate ids or orders, non-positive
    /// limits, and cards whose status disagrees with their column.
    ///
    /// Columns holding more cards than their limit are not reported, since
    /// seeding and non-strict creation may legitimately overfill a column.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut column_ids = HashSet::new();
        let mut orders = HashSet::new();
        let mut card_ids = HashSet::new();

        for col in &self.columns {
            if !column_ids.insert(&col.id) {
                violations.push(format!("duplicate column id '{}'", col.id));
            }
            if !orders.insert(col.order) {
                violations.push(format!("duplicate column order {}", col.order));
            }
            if col.limit == Some(0) {
                violations.push(format!("column '{}' has a zero limit", col.id));
            }
            for card in &col.cards {
                if !card_ids.insert(&card.id) {
                    violations.push(format!("card '{}' appears more than once", card.id));
                }
                if card.status != col.id {
                    violations.push(format!(
                        "card '{}' has status '{}' but is listed in '{}'",
                        card.id, card.status, col.id
                    ));
                }
            }
        }

        violations
    }
}
