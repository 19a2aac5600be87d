//! # CardService

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::Result;
use domains::models::{Card, CardUpdate, CardView, NewCard};
use domains::position::{next_position, settle};
use domains::traits::KanbanStore;
use domains::{archive, diff, AuditAction, EntityKind, Mutation, UserContext, Verb};

use crate::guard::{self, Access};
use crate::{audit, graph};

#[derive(Clone)]
pub struct CardService {
    store: Arc<dyn KanbanStore>,
}

impl CardService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    /// The card with its comments (newest first) and checklists.
    pub async fn get_card(&self, ctx: &UserContext, id: Uuid) -> Result<CardView> {
        let mut uow = self.store.begin().await?;
        let (card, _) = guard::card(uow.as_mut(), ctx, id, Access::Read).await?;
        graph::card_view(uow.as_mut(), card).await
    }

    pub async fn create_card(&self, ctx: &UserContext, input: NewCard) -> Result<Uuid> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        let (list, board) = guard::list(uow.as_mut(), ctx, input.list_id, Access::Write).await?;

        let active = graph::active_card_slots(uow.as_mut(), list.id).await?;
        let now = Utc::now();
        let card = Card {
            id: Uuid::new_v4(),
            list_id: list.id,
            title,
            description: input.description,
            position: next_position(active.len()),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        uow.insert_card(&card).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::Card);
        audit::commit(uow, ctx, Mutation::new(action, card.id, Some(board.id))).await?;
        Ok(card.id)
    }

    /// Edits, archives or restores a card; sibling cards are renumbered like lists.
    pub async fn update_card(&self, ctx: &UserContext, input: CardUpdate) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (before, board) = guard::card(uow.as_mut(), ctx, input.id, Access::Write).await?;
        let mut after = before.clone();

        if let Some(title) = input.title.as_deref() {
            after.title = guard::required("title", title)?;
        }
        if let Some(description) = input.description {
            after.description = description;
        }
        let now = Utc::now();
        let (archived_at, transition) = archive::resolve(before.archived_at, input.archived_at, now);
        after.archived_at = archived_at;
        after.updated_at = now;

        let active = graph::active_card_slots(uow.as_mut(), before.list_id).await?;
        let assignments = settle(&active, before.slot(), transition.placement());
        if let Some(position) = graph::moved_to(&assignments, after.id) {
            after.position = position;
        }
        let siblings: Vec<_> = assignments.into_iter().filter(|a| a.id != after.id).collect();
        graph::write_card_positions(uow.as_mut(), &siblings).await?;

        let changes = diff::diff(&before, &after);
        uow.update_card(&after).await?;

        let action = AuditAction::new(transition.verb(), EntityKind::Card);
        let mutation = Mutation::new(action, after.id, Some(board.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    /// Removes the card with its comments and checklists, then closes the gap in its list.
    pub async fn delete_card(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (card, board) = guard::card(uow.as_mut(), ctx, id, Access::Write).await?;

        graph::delete_card_tree(uow.as_mut(), card.id).await?;
        graph::compact_cards(uow.as_mut(), card.list_id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::Card);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(board.id))).await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_ok;

    use domains::error::ErrorKind;
    use domains::models::{NewChecklist, NewChecklistItem, NewComment};
    use domains::Patch;

    use super::*;
    use crate::fixtures::Harness;

    fn rename(id: Uuid, title: &str) -> CardUpdate {
        CardUpdate { id, title: Some(title.into()), description: None, archived_at: Patch::Absent }
    }

    #[tokio::test]
    async fn title_change_is_the_only_diff_entry() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let list = h.lists(&ctx, board, &["Todo"]).await[0];
        let card = h.cards(&ctx, list, &["Draft"]).await[0];

        assert_ok!(h.services.cards.update_card(&ctx, rename(card, "Final")).await);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "updatecard");
        assert_eq!(
            last.changes.as_deref(),
            Some(r#"[{"field":"title","fromValue":"Draft","toValue":"Final"}]"#)
        );
    }

    #[tokio::test]
    async fn noop_update_still_logs_an_empty_diff() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let list = h.lists(&ctx, board, &["Todo"]).await[0];
        let card = h.cards(&ctx, list, &["Same"]).await[0];

        let input = CardUpdate { id: card, title: None, description: None, archived_at: Patch::Absent };
        assert_ok!(h.services.cards.update_card(&ctx, input).await);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "updatecard");
        assert_eq!(last.changes.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn archiving_a_card_renumbers_its_siblings() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let list = h.lists(&ctx, board, &["Todo"]).await[0];
        let c = h.cards(&ctx, list, &["a", "b", "c"]).await;

        let archive = CardUpdate { id: c[1], title: None, description: None, archived_at: Patch::Value(Utc::now()) };
        assert_ok!(h.services.cards.update_card(&ctx, archive).await);
        assert_eq!(h.card_positions(&ctx, list).await, vec![(c[0], 1), (c[2], 2)]);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "archivecard");

        let restore = CardUpdate { id: c[1], title: None, description: None, archived_at: Patch::Null };
        assert_ok!(h.services.cards.update_card(&ctx, restore).await);
        assert_eq!(h.card_positions(&ctx, list).await, vec![(c[0], 1), (c[2], 2), (c[1], 3)]);
    }

    #[tokio::test]
    async fn failed_log_write_rolls_back_the_update() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let list = h.lists(&ctx, board, &["Todo"]).await[0];
        let card = h.cards(&ctx, list, &["Before"]).await[0];
        let snapshot = h.services.cards.get_card(&ctx, card).await.unwrap();

        h.store.inject_log_failure(true);
        let err = h.services.cards.update_card(&ctx, rename(card, "After")).await.unwrap_err();
        h.store.inject_log_failure(false);

        assert_eq!(err.kind(), ErrorKind::Internal);
        let now = h.services.cards.get_card(&ctx, card).await.unwrap();
        assert_eq!(now.card, snapshot.card);
    }

    #[tokio::test]
    async fn delete_cascades_and_closes_the_gap() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let list = h.lists(&ctx, board, &["Todo"]).await[0];
        let c = h.cards(&ctx, list, &["a", "b", "c"]).await;

        let comment = NewComment { card_id: c[0], content: "hello".into() };
        h.services.comments.create_comment(&ctx, comment).await.unwrap();
        let checklist = NewChecklist { card_id: c[0], title: "steps".into() };
        let checklist = h.services.checklists.create_checklist(&ctx, checklist).await.unwrap();
        let item = NewChecklistItem { checklist_id: checklist, title: "one".into() };
        h.services.checklists.create_checklist_item(&ctx, item).await.unwrap();

        assert_ok!(h.services.cards.delete_card(&ctx, c[0]).await);

        let counts = h.store.row_counts().await;
        assert_eq!((counts.cards, counts.comments, counts.checklists, counts.checklist_items), (2, 0, 0, 0));
        assert_eq!(h.card_positions(&ctx, list).await, vec![(c[1], 1), (c[2], 2)]);
        let err = h.services.cards.get_card(&ctx, c[0]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
