//! Update logs carry the field-level diff as a JSON array.

use chrono::Utc;
use domains::models::{CardUpdate, ChecklistItemUpdate, ChecklistUpdate, NewChecklistItem};
use domains::{LogEntry, Patch};
use integration_tests::Stack;
use serde_json::{json, Value};

async fn last_log(stack: &Stack) -> LogEntry {
    stack.store.all_logs().await.pop().unwrap()
}

fn changes(entry: &LogEntry) -> Value {
    serde_json::from_str(entry.changes.as_deref().unwrap()).unwrap()
}

#[tokio::test]
async fn card_update_reports_each_changed_field_once() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let list = stack.lists(&ctx, board, &["Todo"]).await[0];
    let card = stack.cards(&ctx, list, &["Draft"]).await[0];

    let update = CardUpdate {
        id: card,
        title: Some("Final".into()),
        description: Some("ready to ship".into()),
        ..Default::default()
    };
    stack.services.cards.update_card(&ctx, update).await.unwrap();

    let entry = last_log(&stack).await;
    assert_eq!(entry.action.to_string(), "updatecard");
    assert_eq!(entry.action_target_id, card);
    assert_eq!(
        changes(&entry),
        json!([
            { "field": "title", "fromValue": "Draft", "toValue": "Final" },
            { "field": "description", "fromValue": "", "toValue": "ready to ship" },
        ])
    );
}

#[tokio::test]
async fn archiving_a_card_is_logged_under_its_own_verb() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let list = stack.lists(&ctx, board, &["Todo"]).await[0];
    let cards = stack.cards(&ctx, list, &["A", "B"]).await;

    let archive = CardUpdate { id: cards[0], archived_at: Patch::Value(Utc::now()), ..Default::default() };
    stack.services.cards.update_card(&ctx, archive).await.unwrap();

    let entry = last_log(&stack).await;
    assert_eq!(entry.action.to_string(), "archivecard");
    assert_eq!(entry.board_id, Some(board));
}

#[tokio::test]
async fn checklist_renames_are_diffed_and_checks_are_not() {
    let stack = Stack::new();
    let ctx = stack.user("grace@example.com").await;
    let board = stack.board(&ctx, "Release").await;
    let list = stack.lists(&ctx, board, &["Todo"]).await[0];
    let card = stack.cards(&ctx, list, &["Ship"]).await[0];
    let checklist = stack.decorate_card(&ctx, card, &[]).await;
    let item = stack
        .services
        .checklists
        .create_checklist_item(&ctx, NewChecklistItem { checklist_id: checklist, title: "Tag".into() })
        .await
        .unwrap();

    let rename = ChecklistUpdate { id: checklist, title: "Release steps".into() };
    stack.services.checklists.update_checklist(&ctx, rename).await.unwrap();
    assert_eq!(
        changes(&last_log(&stack).await),
        json!([{ "field": "title", "fromValue": "Steps", "toValue": "Release steps" }])
    );

    let check = ChecklistItemUpdate { id: item, checked: Some(true), ..Default::default() };
    stack.services.checklists.update_checklist_item(&ctx, check).await.unwrap();
    let entry = last_log(&stack).await;
    assert_eq!(entry.action.to_string(), "updatechecklistitem");
    assert_eq!(changes(&entry), json!([]));
}
