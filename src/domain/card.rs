use crate::{
    domain::board::ColumnId,
    error::{KanbanError, Result},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use uuid::Uuid;

string_id!(
    /// Unique identifier for a card within its board
    CardId
);

impl CardId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Card priority, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Lowest,
    Low,
    #[default]
    Medium,
    High,
    Highest,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lowest => "lowest",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Highest => "highest",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lowest" => Ok(Self::Lowest),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "highest" => Ok(Self::Highest),
            _ => Err(KanbanError::validation(
                "priority",
                format!("'{}' is not one of lowest, low, medium, high, highest", s),
            )),
        }
    }
}

/// A checklist item on a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title,
            completed: false,
        }
    }

    pub fn mark_completed(&mut self) {
        self.completed = true;
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// A unit of work held by exactly one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    /// Id of the column currently listing this card
    pub status: ColumnId,
    #[serde(default)]
    pub assignees: BTreeSet<String>,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub actual_hours: Option<f64>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

impl Card {
    /// Creates a card with the given ID and title, held by `status`
    pub fn new(id: CardId, title: String, status: ColumnId) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            description: String::new(),
            priority: Priority::default(),
            status,
            assignees: BTreeSet::new(),
            labels: BTreeSet::new(),
            due_date: None,
            created_at: now,
            updated_at: now,
            estimated_hours: None,
            actual_hours: None,
            subtasks: Vec::new(),
        }
    }

    /// Bumps `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Appends a subtask and returns its id
    pub fn add_subtask(&mut self, title: String) -> Result<String> {
        validate_title("subtask title", &title)?;
        let subtask = Subtask::new(title);
        let id = subtask.id.clone();
        self.subtasks.push(subtask);
        self.touch();
        Ok(id)
    }

    /// Flips a subtask's completion flag, returning the new state
    pub fn toggle_subtask(&mut self, subtask_id: &str) -> Result<bool> {
        let subtask = self
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)
            .ok_or_else(|| KanbanError::SubtaskNotFound(subtask_id.to_string()))?;
        subtask.toggle();
        let completed = subtask.completed;
        self.touch();
        Ok(completed)
    }

    pub fn remove_subtask(&mut self, subtask_id: &str) -> Result<Subtask> {
        let pos = self
            .subtasks
            .iter()
            .position(|s| s.id == subtask_id)
            .ok_or_else(|| KanbanError::SubtaskNotFound(subtask_id.to_string()))?;
        let removed = self.subtasks.remove(pos);
        self.touch();
        Ok(removed)
    }

    /// Returns (completed, total) subtask counts
    pub fn subtask_progress(&self) -> (usize, usize) {
        let completed = self.subtasks.iter().filter(|s| s.completed).count();
        (completed, self.subtasks.len())
    }

    /// True when the due date lies strictly before `now`
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_date.is_some_and(|due| due < now)
    }
}

/// Input for creating a card
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCard {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignees: BTreeSet<String>,
    pub labels: BTreeSet<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    /// Titles of the initial subtasks
    pub subtasks: Vec<String>,
}

impl NewCard {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
        self.assignees.insert(user_id.into());
        self
    }

    pub fn with_label(mut self, label_id: impl Into<String>) -> Self {
        self.labels.insert(label_id.into());
        self
    }

    pub fn with_due_date(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_estimate(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_subtask(mut self, title: impl Into<String>) -> Self {
        self.subtasks.push(title.into());
        self
    }

    /// Checks the fields that do not depend on board contents
    pub fn validate(&self) -> Result<()> {
        validate_title("title", &self.title)?;
        validate_hours("estimatedHours", self.estimated_hours)?;
        validate_hours("actualHours", self.actual_hours)?;
        for title in &self.subtasks {
            validate_title("subtask title", title)?;
        }
        Ok(())
    }

    /// Builds the card placed in `status`
    pub fn into_card(self, id: CardId, status: ColumnId) -> Card {
        let mut card = Card::new(id, self.title, status);
        card.description = self.description;
        card.priority = self.priority;
        card.assignees = self.assignees;
        card.labels = self.labels;
        card.due_date = self.due_date;
        card.estimated_hours = self.estimated_hours;
        card.actual_hours = self.actual_hours;
        card.subtasks = self.subtasks.into_iter().map(Subtask::new).collect();
        card
    }
}

/// Partial update of a card's editable fields.
///
/// `None` leaves a field untouched. For nullable fields, `Some(None)` clears
/// the value; in JSON an explicit `null` maps to `Some(None)`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignees: Option<BTreeSet<String>>,
    pub labels: Option<BTreeSet<String>>,
    #[serde(deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(deserialize_with = "double_option")]
    pub estimated_hours: Option<Option<f64>>,
    #[serde(deserialize_with = "double_option")]
    pub actual_hours: Option<Option<f64>>,
    pub subtasks: Option<Vec<Subtask>>,
}

impl CardPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_title("title", title)?;
        }
        if let Some(hours) = self.estimated_hours {
            validate_hours("estimatedHours", hours)?;
        }
        if let Some(hours) = self.actual_hours {
            validate_hours("actualHours", hours)?;
        }
        if let Some(subtasks) = &self.subtasks {
            let mut seen = BTreeSet::new();
            for subtask in subtasks {
                validate_title("subtask title", &subtask.title)?;
                if !seen.insert(subtask.id.as_str()) {
                    return Err(KanbanError::validation(
                        "subtasks",
                        format!("duplicate subtask id '{}'", subtask.id),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Merges the patch into `card`. Never touches `status`.
    pub fn apply_to(self, card: &mut Card) {
        if let Some(title) = self.title {
            card.title = title;
        }
        if let Some(description) = self.description {
            card.description = description;
        }
        if let Some(priority) = self.priority {
            card.priority = priority;
        }
        if let Some(assignees) = self.assignees {
            card.assignees = assignees;
        }
        if let Some(labels) = self.labels {
            card.labels = labels;
        }
        if let Some(due_date) = self.due_date {
            card.due_date = due_date;
        }
        if let Some(hours) = self.estimated_hours {
            card.estimated_hours = hours;
        }
        if let Some(hours) = self.actual_hours {
            card.actual_hours = hours;
        }
        if let Some(subtasks) = self.subtasks {
            card.subtasks = subtasks;
        }
        card.touch();
    }
}

fn double_option<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn validate_title(field: &str, title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(KanbanError::validation(field, "must not be empty"));
    }
    Ok(())
}

fn validate_hours(field: &str, hours: Option<f64>) -> Result<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(KanbanError::validation(
            field,
            format!("{} is not a non-negative number of hours", h),
        )),
        _ => Ok(()),
    }
}
