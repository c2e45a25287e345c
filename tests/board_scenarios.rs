use kanban_core::{
    storage::{FileStorage, MemoryStorage},
    Board, BoardId, BoardSettings, BoardStore, Card, CardFilters, CardId, Column, ColumnId,
    ErrorKind, KanbanError, LoadOutcome, NewCard, Snapshot, Storage,
};
use std::sync::Arc;
use tempfile::TempDir;

fn board_id() -> BoardId {
    BoardId::from("board")
}

fn col(id: &str) -> ColumnId {
    ColumnId::from(id)
}

fn board() -> Board {
    Board::new("board", "Scenarios")
        .with_column(Column::new("todo", "To Do", 0))
        .with_column(Column::new("in-progress", "In Progress", 1).with_limit(3))
        .with_column(Column::new("done", "Done", 2))
        .with_settings(BoardSettings {
            auto_save: false,
            ..BoardSettings::default()
        })
}

fn store() -> BoardStore {
    BoardStore::new(vec![board()], Arc::new(MemoryStorage::new()))
}

fn column_len(store: &BoardStore, column: &str) -> usize {
    store
        .board(&board_id())
        .unwrap()
        .column(&col(column))
        .unwrap()
        .cards
        .len()
}

async fn add(store: &mut BoardStore, column: &str, card: NewCard) -> Card {
    store.add_card(&board_id(), &col(column), card).await.unwrap()
}

#[tokio::test]
async fn test_move_into_full_column_keeps_card_in_place() {
    let mut store = store();
    for i in 0..3 {
        let card = add(&mut store, "todo", NewCard::new(format!("card {}", i))).await;
        store
            .move_card(&board_id(), &card.id, &col("in-progress"))
            .await
            .unwrap();
    }
    let card4 = add(&mut store, "todo", NewCard::new("card 4")).await;
    assert_eq!(column_len(&store, "in-progress"), 3);

    let err = store
        .move_card(&board_id(), &card4.id, &col("in-progress"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::WipLimitExceeded);
    let board = store.board(&board_id()).unwrap();
    assert_eq!(board.card(&card4.id).unwrap().status, col("todo"));
    assert_eq!(board.column(&col("todo")).unwrap().cards[0].id, card4.id);
    assert_eq!(column_len(&store, "in-progress"), 3);
}

#[tokio::test]
async fn test_add_then_move_to_done() {
    let mut store = store();
    add(&mut store, "todo", NewCard::new("Existing")).await;

    let card = add(&mut store, "todo", NewCard::new("Write spec")).await;
    let todo_before = column_len(&store, "todo");
    let done_before = column_len(&store, "done");

    let moved = store
        .move_card(&board_id(), &card.id, &col("done"))
        .await
        .unwrap();

    assert_eq!(column_len(&store, "todo"), todo_before - 1);
    assert_eq!(column_len(&store, "done"), done_before + 1);
    assert_eq!(moved.status, col("done"));
    assert_eq!(
        store.board(&board_id()).unwrap().card(&card.id).unwrap().status,
        col("done")
    );
}

#[tokio::test]
async fn test_search_spans_all_columns() {
    let mut store = store();
    let a = add(&mut store, "todo", NewCard::new("Implement AUTH")).await;
    let b = add(
        &mut store,
        "done",
        NewCard::new("Docs").with_description("covers oauth tokens"),
    )
    .await;
    let c = add(&mut store, "in-progress", NewCard::new("Author bio page")).await;
    add(&mut store, "todo", NewCard::new("Unrelated")).await;
    add(&mut store, "done", NewCard::new("Release notes")).await;

    let found = store
        .apply_filters(&board_id(), &CardFilters::search("auth"))
        .unwrap();
    let mut ids: Vec<&CardId> = found.iter().map(|card| &card.id).collect();
    ids.sort();
    let mut expected = vec![&a.id, &b.id, &c.id];
    expected.sort();

    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_filters_do_not_affect_wip_accounting() {
    let mut store = store();
    for i in 0..3 {
        let card = add(&mut store, "todo", NewCard::new(format!("hidden {}", i))).await;
        store
            .move_card(&board_id(), &card.id, &col("in-progress"))
            .await
            .unwrap();
    }
    let visible = add(&mut store, "todo", NewCard::new("visible")).await;

    let view = store
        .column_view(
            &board_id(),
            &CardFilters::search("visible"),
            &col("in-progress"),
        )
        .unwrap();
    assert!(view.is_empty());

    let err = store
        .move_card(&board_id(), &visible.id, &col("in-progress"))
        .await
        .unwrap_err();
    assert!(matches!(err, KanbanError::WipLimitExceeded { .. }));
}

#[tokio::test]
async fn test_delete_missing_card_leaves_board_untouched() {
    let mut store = store();
    add(&mut store, "todo", NewCard::new("keep me")).await;
    let before = serde_json::to_string(store.boards()).unwrap();

    let err = store
        .delete_card(&board_id(), &CardId::from("nonexistent-id"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(serde_json::to_string(store.boards()).unwrap(), before);
}

#[tokio::test]
async fn test_corrupt_snapshot_falls_back_to_seed() {
    let storage = Arc::new(MemoryStorage::with_document(r#"{"boards": [{"id": "x", "tit"#));

    let err = storage.load_snapshot().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);

    let (store, outcome) = BoardStore::open(storage).await;
    match outcome {
        LoadOutcome::Seeded { reason } => assert_eq!(reason.kind(), ErrorKind::Persistence),
        LoadOutcome::Restored => panic!("corrupt snapshot must not be restored"),
    }
    assert_eq!(store.boards().len(), kanban_core::seed::default_boards().len());
    assert!(store
        .board(&BoardId::from(kanban_core::seed::DEFAULT_BOARD_ID))
        .is_ok());
}

#[tokio::test]
async fn test_file_snapshot_round_trip_through_store() {
    let temp_dir = TempDir::new().unwrap();
    let storage = Arc::new(FileStorage::new(temp_dir.path()));

    let (mut store, outcome) = BoardStore::open(storage.clone()).await;
    assert!(matches!(
        outcome,
        LoadOutcome::Seeded {
            reason: KanbanError::SnapshotMissing(_)
        }
    ));

    // Seed board autosaves
    let main = BoardId::from(kanban_core::seed::DEFAULT_BOARD_ID);
    let card = store
        .add_card(&main, &col("todo"), NewCard::new("Persist me").with_estimate(2.5))
        .await
        .unwrap();
    store
        .move_card(&main, &card.id, &col("in-progress"))
        .await
        .unwrap();
    assert!(store.take_save_error().is_none());

    let (reopened, outcome) = BoardStore::open(storage).await;
    assert!(outcome.is_restored());
    assert_eq!(reopened.boards(), store.boards());
}

#[tokio::test]
async fn test_snapshot_round_trip_is_lossless() {
    let mut store = store();
    let card = add(
        &mut store,
        "todo",
        NewCard::new("Dated")
            .with_due_date(chrono::Utc::now())
            .with_subtask("one"),
    )
    .await;
    store
        .add_subtask(&board_id(), &card.id, "two")
        .await
        .unwrap();

    let json = store.snapshot().to_json().unwrap();
    let restored = Snapshot::from_json(&json).unwrap();
    assert_eq!(restored.boards, store.boards());
}
