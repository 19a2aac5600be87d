//! # ListService
//!
//! Lists sit on the dense position sequence of their board and own an ordered
//! set of cards.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{List, ListUpdate, ListView, NewList};
use domains::position::{apply_explicit_order, next_position, parse_id_list, settle};
use domains::traits::KanbanStore;
use domains::{archive, diff, AuditAction, EntityKind, Mutation, UserContext, Verb};

use crate::guard::{self, Access};
use crate::{audit, graph};

#[derive(Clone)]
pub struct ListService {
    store: Arc<dyn KanbanStore>,
}

impl ListService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    /// The list with its active cards, by position.
    pub async fn get_list(&self, ctx: &UserContext, id: Uuid) -> Result<ListView> {
        let mut uow = self.store.begin().await?;
        let (list, _) = guard::list(uow.as_mut(), ctx, id, Access::Read).await?;
        graph::list_view(uow.as_mut(), list).await
    }

    pub async fn create_list(&self, ctx: &UserContext, input: NewList) -> Result<Uuid> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        let board = guard::board(uow.as_mut(), ctx, input.board_id, Access::Write).await?;

        let active = graph::active_list_slots(uow.as_mut(), board.id).await?;
        let now = Utc::now();
        let list = List {
            id: Uuid::new_v4(),
            board_id: board.id,
            title,
            position: next_position(active.len()),
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        uow.insert_list(&list).await?;
        tracing::debug!(list_id = %list.id, position = list.position, "list placed");

        let action = AuditAction::new(Verb::Create, EntityKind::List);
        audit::commit(uow, ctx, Mutation::new(action, list.id, Some(board.id))).await?;
        Ok(list.id)
    }

    /// Renames, archives or restores a list.
    ///
    /// The board's active lists are renumbered on every call so an archive
    /// closes its gap and a restore lands at the end.
    pub async fn update_list(&self, ctx: &UserContext, input: ListUpdate) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (before, board) = guard::list(uow.as_mut(), ctx, input.id, Access::Write).await?;
        let mut after = before.clone();

        if let Some(title) = input.title.as_deref() {
            after.title = guard::required("title", title)?;
        }
        let now = Utc::now();
        let (archived_at, transition) = archive::resolve(before.archived_at, input.archived_at, now);
        after.archived_at = archived_at;
        after.updated_at = now;

        let active = graph::active_list_slots(uow.as_mut(), board.id).await?;
        let assignments = settle(&active, before.slot(), transition.placement());
        if let Some(position) = graph::moved_to(&assignments, after.id) {
            after.position = position;
        }
        let siblings: Vec<_> = assignments.into_iter().filter(|a| a.id != after.id).collect();
        graph::write_list_positions(uow.as_mut(), &siblings).await?;

        let changes = diff::diff(&before, &after);
        uow.update_list(&after).await?;

        let action = AuditAction::new(transition.verb(), EntityKind::List);
        let mutation = Mutation::new(action, after.id, Some(board.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    /// Removes the list with its cards, then closes the gap among the board's lists.
    pub async fn delete_list(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (list, board) = guard::list(uow.as_mut(), ctx, id, Access::Write).await?;

        graph::delete_list_tree(uow.as_mut(), list.id).await?;
        graph::compact_lists(uow.as_mut(), board.id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::List);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(board.id))).await
    }

    /// Applies `idsordered` to the list's active cards.
    pub async fn reorder_cards(&self, ctx: &UserContext, list_id: Uuid, ids_ordered: &str) -> Result<()> {
        let ids = parse_id_list(ids_ordered)?;
        let mut uow = self.store.begin().await?;
        let (list, board) = guard::list(uow.as_mut(), ctx, list_id, Access::Write).await?;

        let active = graph::active_card_slots(uow.as_mut(), list.id).await?;
        for id in &ids {
            if !active.iter().any(|s| s.id == *id) && uow.find_card(*id).await?.is_none() {
                return Err(AppError::not_found(EntityKind::Card, id));
            }
        }
        let assignments = apply_explicit_order(&ids, &active, EntityKind::Card, EntityKind::List, list.id)?;
        graph::write_card_positions(uow.as_mut(), &assignments).await?;

        let action = AuditAction::new(Verb::Reorder, EntityKind::Card);
        audit::commit(uow, ctx, Mutation::new(action, list.id, Some(board.id))).await
    }
}
