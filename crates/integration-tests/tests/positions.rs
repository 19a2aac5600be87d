//! Dense 1-based ordering across create, archive, restore, reorder and delete.

use chrono::Utc;
use domains::error::ErrorKind;
use domains::models::{CardUpdate, ListUpdate};
use domains::Patch;
use integration_tests::Stack;
use tokio_test::assert_ok;

fn titled(pairs: &[(&str, i32)]) -> Vec<(String, i32)> {
    pairs.iter().map(|(t, p)| (t.to_string(), *p)).collect()
}

#[tokio::test]
async fn card_sequence_stays_dense_through_a_full_lifecycle() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let list = stack.lists(&ctx, board, &["Todo"]).await[0];
    let cards = stack.cards(&ctx, list, &["A", "B", "C", "D"]).await;

    let archive = CardUpdate { id: cards[1], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    assert_ok!(stack.services.cards.update_card(&ctx, archive).await);
    assert_eq!(stack.card_order(&ctx, list).await, titled(&[("A", 1), ("C", 2), ("D", 3)]));

    let restore = CardUpdate { id: cards[1], archived_at: Patch::Null, ..Default::default() };
    assert_ok!(stack.services.cards.update_card(&ctx, restore).await);
    assert_eq!(stack.card_order(&ctx, list).await, titled(&[("A", 1), ("C", 2), ("D", 3), ("B", 4)]));

    let order = format!("{},{}", cards[3], cards[0]);
    assert_ok!(stack.services.lists.reorder_cards(&ctx, list, &order).await);
    assert_eq!(stack.card_order(&ctx, list).await, titled(&[("D", 1), ("A", 2), ("C", 3), ("B", 4)]));

    assert_ok!(stack.services.cards.delete_card(&ctx, cards[0]).await);
    assert_eq!(stack.card_order(&ctx, list).await, titled(&[("D", 1), ("C", 2), ("B", 3)]));

    let created = stack.cards(&ctx, list, &["E"]).await[0];
    let view = stack.services.cards.get_card(&ctx, created).await.unwrap();
    assert_eq!(view.card.position, 4);
}

#[tokio::test]
async fn archived_list_does_not_count_towards_new_positions() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let lists = stack.lists(&ctx, board, &["Todo", "Doing"]).await;

    let archive = ListUpdate { id: lists[0], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    assert_ok!(stack.services.lists.update_list(&ctx, archive).await);
    stack.lists(&ctx, board, &["Done"]).await;

    assert_eq!(stack.list_order(&ctx, board).await, titled(&[("Doing", 1), ("Done", 2)]));
}

#[tokio::test]
async fn archived_card_cannot_be_reordered() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let list = stack.lists(&ctx, board, &["Todo"]).await[0];
    let cards = stack.cards(&ctx, list, &["A", "B"]).await;

    let archive = CardUpdate { id: cards[0], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    stack.services.cards.update_card(&ctx, archive).await.unwrap();

    let err = stack
        .services
        .lists
        .reorder_cards(&ctx, list, &cards[0].to_string())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownSibling);
    assert_eq!(stack.card_order(&ctx, list).await, titled(&[("B", 1)]));
}

#[tokio::test]
async fn rejected_reorder_leaves_positions_untouched() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let lists = stack.lists(&ctx, board, &["A", "B", "C"]).await;
    let before = stack.list_order(&ctx, board).await;
    let logs_before = stack.store.all_logs().await.len();

    let order = format!("{},{},{}", lists[2], lists[0], lists[2]);
    let err = stack.services.boards.reorder_lists(&ctx, board, &order).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);

    assert_eq!(stack.list_order(&ctx, board).await, before);
    assert_eq!(stack.store.all_logs().await.len(), logs_before);
}
