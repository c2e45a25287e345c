//! Default board set used on first start and whenever a snapshot cannot be restored.

use crate::domain::{
    Board, BoardSettings, Card, CardId, Column, ColumnId, Label, Priority, Subtask, User,
};
use chrono::{Duration, Utc};

pub const DEFAULT_BOARD_ID: &str = "main";

/// Builds the seed boards. Card timestamps are taken from the current clock.
pub fn default_boards() -> Vec<Board> {
    vec![default_board()]
}

fn default_board() -> Board {
    let now = Utc::now();

    let mut backlog = Column::new("backlog", "Backlog", 0).with_color("#64748b");
    let mut todo = Column::new("todo", "To Do", 1).with_color("#3b82f6");
    let mut in_progress = Column::new("in-progress", "In Progress", 2)
        .with_color("#f59e0b")
        .with_limit(3);
    let mut review = Column::new("review", "Review", 3)
        .with_color("#8b5cf6")
        .with_limit(2);
    let mut done = Column::new("done", "Done", 4).with_color("#10b981");

    let mut research = card(
        "card-1",
        "Research competitor boards",
        "Collect notes on how other tools present WIP limits",
        &backlog.id,
        Priority::Low,
    );
    research.labels.insert("research".to_string());
    research.estimated_hours = Some(4.0);
    backlog.cards.push(research);

    let mut auth = card(
        "card-2",
        "Implement user authentication",
        "Login, logout and session refresh",
        &todo.id,
        Priority::High,
    );
    auth.assignees.insert("alice".to_string());
    auth.labels.insert("backend".to_string());
    auth.due_date = Some(now + Duration::days(7));
    auth.estimated_hours = Some(12.0);
    auth.subtasks = vec![
        Subtask::new("Password hashing".to_string()),
        Subtask::new("Session tokens".to_string()),
    ];
    todo.cards.push(auth);

    let mut drag = card(
        "card-3",
        "Drag and drop between columns",
        "",
        &in_progress.id,
        Priority::Medium,
    );
    drag.assignees.insert("bob".to_string());
    drag.labels.insert("frontend".to_string());
    drag.estimated_hours = Some(6.0);
    drag.actual_hours = Some(2.5);
    in_progress.cards.push(drag);

    let mut fix = card(
        "card-4",
        "Fix card overflow on small screens",
        "Long titles push the column wider than the viewport",
        &review.id,
        Priority::Highest,
    );
    fix.assignees.insert("carol".to_string());
    fix.labels.insert("bug".to_string());
    fix.due_date = Some(now - Duration::days(1));
    review.cards.push(fix);

    let mut setup = card(
        "card-5",
        "Project setup",
        "Repository, CI and lint configuration",
        &done.id,
        Priority::Medium,
    );
    setup.assignees.insert("alice".to_string());
    setup.estimated_hours = Some(3.0);
    setup.actual_hours = Some(3.5);
    let mut ci = Subtask::new("CI pipeline".to_string());
    ci.mark_completed();
    setup.subtasks = vec![ci];
    done.cards.push(setup);

    let mut board = Board::new(DEFAULT_BOARD_ID, "Product Roadmap")
        .with_user(User::new("alice", "Alice Johnson"))
        .with_user(User::new("bob", "Bob Smith"))
        .with_user(User::new("carol", "Carol Diaz"))
        .with_label(Label::new("bug", "Bug", "#ef4444"))
        .with_label(Label::new("frontend", "Frontend", "#3b82f6"))
        .with_label(Label::new("backend", "Backend", "#22c55e"))
        .with_label(Label::new("research", "Research", "#a855f7"))
        .with_settings(BoardSettings::default())
        .with_column(backlog)
        .with_column(todo)
        .with_column(in_progress)
        .with_column(review)
        .with_column(done);
    board.description = "Seed board for planning and tracking product work".to_string();
    board
}

fn card(id: &str, title: &str, description: &str, column: &ColumnId, priority: Priority) -> Card {
    let mut card = Card::new(CardId::from(id), title.to_string(), column.clone());
    card.description = description.to_string();
    card.priority = priority;
    card
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_satisfies_invariants() {
        for board in default_boards() {
            assert!(board.invariant_violations().is_empty());
            assert!(board.columns.iter().all(|col| !col.is_over_limit()));
            for card in board.cards() {
                board
                    .check_references(&card.assignees, &card.labels)
                    .unwrap();
            }
        }
    }

    #[test]
    fn test_seed_layout() {
        let boards = default_boards();
        assert_eq!(boards.len(), 1);
        let board = &boards[0];
        assert_eq!(board.id.as_str(), DEFAULT_BOARD_ID);
        assert_eq!(board.terminal_column().unwrap().id.as_str(), "done");
        assert_eq!(
            board.column(&ColumnId::from("in-progress")).unwrap().limit,
            Some(3)
        );
        assert_eq!(board.card_count(), 5);
    }
}
