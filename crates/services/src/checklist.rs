//! # ChecklistService
//!
//! Checklists belong to a card; their items use the same explicit ordering as
//! cards and lists, but deleting an item leaves the others where they are.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{
    Checklist, ChecklistItem, ChecklistItemUpdate, ChecklistUpdate, ChecklistView, NewChecklist, NewChecklistItem,
};
use domains::position::{apply_explicit_order, next_position, parse_id_list};
use domains::traits::KanbanStore;
use domains::{diff, AuditAction, EntityKind, Mutation, UserContext, Verb};

use crate::guard::{self, Access};
use crate::{audit, graph};

#[derive(Clone)]
pub struct ChecklistService {
    store: Arc<dyn KanbanStore>,
}

impl ChecklistService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    pub async fn get_checklist(&self, ctx: &UserContext, id: Uuid) -> Result<ChecklistView> {
        let mut uow = self.store.begin().await?;
        let (checklist, _) = guard::checklist(uow.as_mut(), ctx, id, Access::Read).await?;
        let items = uow.items_of_checklist(checklist.id).await?;
        Ok(ChecklistView { checklist, items })
    }

    pub async fn create_checklist(&self, ctx: &UserContext, input: NewChecklist) -> Result<Uuid> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        let (card, board) = guard::card(uow.as_mut(), ctx, input.card_id, Access::Write).await?;

        let now = Utc::now();
        let checklist = Checklist { id: Uuid::new_v4(), card_id: card.id, title, created_at: now, updated_at: now };
        uow.insert_checklist(&checklist).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::Checklist);
        audit::commit(uow, ctx, Mutation::new(action, checklist.id, Some(board.id))).await?;
        Ok(checklist.id)
    }

    pub async fn update_checklist(&self, ctx: &UserContext, input: ChecklistUpdate) -> Result<()> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        let (before, board) = guard::checklist(uow.as_mut(), ctx, input.id, Access::Write).await?;

        let after = Checklist { title, updated_at: Utc::now(), ..before.clone() };
        let changes = diff::diff(&before, &after);
        uow.update_checklist(&after).await?;

        let action = AuditAction::new(Verb::Update, EntityKind::Checklist);
        let mutation = Mutation::new(action, after.id, Some(board.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    /// Removes the checklist and its items.
    pub async fn delete_checklist(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (checklist, board) = guard::checklist(uow.as_mut(), ctx, id, Access::Write).await?;
        graph::delete_checklist_tree(uow.as_mut(), checklist.id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::Checklist);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(board.id))).await
    }

    // --- Items ---

    pub async fn get_checklist_item(&self, ctx: &UserContext, id: Uuid) -> Result<ChecklistItem> {
        let mut uow = self.store.begin().await?;
        let (item, _) = guard::checklist_item(uow.as_mut(), ctx, id, Access::Read).await?;
        Ok(item)
    }

    pub async fn create_checklist_item(&self, ctx: &UserContext, input: NewChecklistItem) -> Result<Uuid> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        let (checklist, board) = guard::checklist(uow.as_mut(), ctx, input.checklist_id, Access::Write).await?;

        let siblings = graph::item_slots(uow.as_mut(), checklist.id).await?;
        let now = Utc::now();
        let item = ChecklistItem {
            id: Uuid::new_v4(),
            checklist_id: checklist.id,
            title,
            // Item deletes leave gaps: stay above the highest taken position.
            position: next_position(siblings.len()).max(siblings.iter().map(|s| s.position + 1).max().unwrap_or(1)),
            checked: false,
            created_at: now,
            updated_at: now,
        };
        uow.insert_checklist_item(&item).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::ChecklistItem);
        audit::commit(uow, ctx, Mutation::new(action, item.id, Some(board.id))).await?;
        Ok(item.id)
    }

    /// Renames or (un)checks an item. Only the title is diffed.
    pub async fn update_checklist_item(&self, ctx: &UserContext, input: ChecklistItemUpdate) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (before, board) = guard::checklist_item(uow.as_mut(), ctx, input.id, Access::Write).await?;
        let mut after = before.clone();

        if let Some(title) = input.title.as_deref() {
            after.title = guard::required("title", title)?;
        }
        if let Some(checked) = input.checked {
            after.checked = checked;
        }
        after.updated_at = Utc::now();

        let changes = diff::diff(&before, &after);
        uow.update_checklist_item(&after).await?;

        let action = AuditAction::new(Verb::Update, EntityKind::ChecklistItem);
        let mutation = Mutation::new(action, after.id, Some(board.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    pub async fn delete_checklist_item(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (item, board) = guard::checklist_item(uow.as_mut(), ctx, id, Access::Write).await?;
        uow.delete_checklist_item(item.id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::ChecklistItem);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(board.id))).await
    }

    /// Applies `idsordered` to the checklist's items.
    pub async fn reorder_items(&self, ctx: &UserContext, checklist_id: Uuid, ids_ordered: &str) -> Result<()> {
        let ids = parse_id_list(ids_ordered)?;
        let mut uow = self.store.begin().await?;
        let (checklist, board) = guard::checklist(uow.as_mut(), ctx, checklist_id, Access::Write).await?;

        let siblings = graph::item_slots(uow.as_mut(), checklist.id).await?;
        for id in &ids {
            if !siblings.iter().any(|s| s.id == *id) && uow.find_checklist_item(*id).await?.is_none() {
                return Err(AppError::not_found(EntityKind::ChecklistItem, id));
            }
        }
        let assignments =
            apply_explicit_order(&ids, &siblings, EntityKind::ChecklistItem, EntityKind::Checklist, checklist.id)?;
        graph::write_item_positions(uow.as_mut(), &assignments).await?;

        let action = AuditAction::new(Verb::Reorder, EntityKind::ChecklistItem);
        audit::commit(uow, ctx, Mutation::new(action, checklist.id, Some(board.id))).await
    }
}
