//! A mutation and its audit row commit together or not at all.

use chrono::Utc;
use domains::models::{ListUpdate, NewList};
use domains::Patch;
use integration_tests::Stack;

#[tokio::test]
async fn failed_log_write_discards_the_mutation() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let lists = stack.lists(&ctx, board, &["A", "B", "C"]).await;
    let counts = stack.store.row_counts().await;

    stack.store.inject_log_failure(true);

    let input = NewList { board_id: board, title: "D".into() };
    assert!(stack.services.lists.create_list(&ctx, input).await.is_err());

    let archive = ListUpdate { id: lists[0], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    assert!(stack.services.lists.update_list(&ctx, archive).await.is_err());

    assert!(stack.services.boards.delete_board(&ctx, board).await.is_err());

    stack.store.inject_log_failure(false);

    assert_eq!(stack.store.row_counts().await, counts);
    let order = stack.list_order(&ctx, board).await;
    assert_eq!(order.iter().map(|(_, p)| *p).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[tokio::test]
async fn every_successful_mutation_leaves_exactly_one_log() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let lists = stack.lists(&ctx, board, &["A", "B"]).await;
    stack.cards(&ctx, lists[0], &["x"]).await;

    let order = format!("{},{}", lists[1], lists[0]);
    stack.services.boards.reorder_lists(&ctx, board, &order).await.unwrap();

    let actions: Vec<String> = stack.store.all_logs().await.iter().map(|l| l.action.to_string()).collect();
    assert_eq!(actions, vec!["createboard", "createlist", "createlist", "createcard", "reorderlists"]);
}
