use crate::domain::card::Card;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

/// Fields available for sorting cards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Title,
    Priority,
    Created,
    Updated,
    Due,
    Estimate,
    SubtaskProgress,
}

/// Sort order direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "priority" => Ok(SortField::Priority),
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            "due" => Ok(SortField::Due),
            "estimate" => Ok(SortField::Estimate),
            "subtask-progress" => Ok(SortField::SubtaskProgress),
            _ => Err(format!(
                "Invalid sort field '{}'. Valid fields: title, priority, created, updated, due, estimate, subtask-progress",
                s
            )),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            _ => Err(format!(
                "Invalid sort order '{}'. Valid orders: asc, desc",
                s
            )),
        }
    }
}

/// Sorts a card list for display.
///
/// Works on borrowed views such as the output of
/// [`apply_filters`](crate::domain::filter::apply_filters); board state is
/// never reordered. The sort is stable, so ties keep column order.
///
/// # Examples
/// ```
/// use kanban_core::domain::sorting::{sort_cards, SortField, SortOrder};
/// use kanban_core::domain::{Card, CardId, ColumnId, Priority};
///
/// let mut low = Card::new(CardId::from("a"), "A".to_string(), ColumnId::from("todo"));
/// low.priority = Priority::Low;
/// let mut high = Card::new(CardId::from("b"), "B".to_string(), ColumnId::from("todo"));
/// high.priority = Priority::High;
///
/// let mut cards = vec![&low, &high];
/// sort_cards(&mut cards, SortField::Priority, SortOrder::Descending);
/// assert_eq!(cards[0].id.as_str(), "b");
/// ```
pub fn sort_cards(cards: &mut [&Card], field: SortField, order: SortOrder) {
    cards.sort_by(|a, b| {
        // Absent due dates and estimates stay last in either direction
        if let Some(ord) = missing_last(field, a, b) {
            return ord;
        }

        let cmp = match field {
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Priority => a.priority.cmp(&b.priority),
            SortField::Created => a.created_at.cmp(&b.created_at),
            SortField::Updated => a.updated_at.cmp(&b.updated_at),
            SortField::Due => compare_option_dates(a.due_date, b.due_date),
            SortField::Estimate => a
                .estimated_hours
                .partial_cmp(&b.estimated_hours)
                .unwrap_or(Ordering::Equal),
            SortField::SubtaskProgress => compare_subtask_progress(a, b),
        };

        match order {
            SortOrder::Ascending => cmp,
            SortOrder::Descending => cmp.reverse(),
        }
    });
}

fn missing_last(field: SortField, a: &Card, b: &Card) -> Option<Ordering> {
    let (a_present, b_present) = match field {
        SortField::Due => (a.due_date.is_some(), b.due_date.is_some()),
        SortField::Estimate => (a.estimated_hours.is_some(), b.estimated_hours.is_some()),
        _ => return None,
    };
    match (a_present, b_present) {
        (true, false) => Some(Ordering::Less),
        (false, true) => Some(Ordering::Greater),
        _ => None,
    }
}

fn compare_option_dates(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a_date), Some(b_date)) => a_date.cmp(&b_date),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compare by subtask completion percentage; cards without subtasks count as 0%
fn compare_subtask_progress(a: &Card, b: &Card) -> Ordering {
    fn progress_pct(card: &Card) -> f64 {
        match card.subtask_progress() {
            (_, 0) => 0.0,
            (completed, total) => completed as f64 / total as f64,
        }
    }

    progress_pct(a)
        .partial_cmp(&progress_pct(b))
        .unwrap_or(Ordering::Equal)
}
