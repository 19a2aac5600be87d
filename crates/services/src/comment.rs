//! # CommentService

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::Result;
use domains::models::{Comment, CommentUpdate, NewComment};
use domains::traits::KanbanStore;
use domains::{diff, AuditAction, EntityKind, Mutation, UserContext, Verb};

use crate::audit;
use crate::guard::{self, Access};

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn KanbanStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    pub async fn get_comment(&self, ctx: &UserContext, id: Uuid) -> Result<Comment> {
        let mut uow = self.store.begin().await?;
        let (comment, _) = guard::comment(uow.as_mut(), ctx, id, Access::Read).await?;
        Ok(comment)
    }

    /// Comments of a card, newest first.
    pub async fn get_comments(&self, ctx: &UserContext, card_id: Uuid) -> Result<Vec<Comment>> {
        let mut uow = self.store.begin().await?;
        let (card, _) = guard::card(uow.as_mut(), ctx, card_id, Access::Read).await?;
        uow.comments_of_card(card.id).await
    }

    pub async fn create_comment(&self, ctx: &UserContext, input: NewComment) -> Result<Uuid> {
        let content = guard::required("content", &input.content)?;
        let mut uow = self.store.begin().await?;
        let (card, board) = guard::card(uow.as_mut(), ctx, input.card_id, Access::Write).await?;

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            card_id: card.id,
            user_id: ctx.user_id,
            content,
            created_at: now,
            updated_at: now,
        };
        uow.insert_comment(&comment).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::Comment);
        audit::commit(uow, ctx, Mutation::new(action, comment.id, Some(board.id))).await?;
        Ok(comment.id)
    }

    pub async fn update_comment(&self, ctx: &UserContext, input: CommentUpdate) -> Result<()> {
        let content = guard::required("content", &input.content)?;
        let mut uow = self.store.begin().await?;
        let (before, board) = guard::comment(uow.as_mut(), ctx, input.id, Access::Write).await?;

        let after = Comment { content, updated_at: Utc::now(), ..before.clone() };
        let changes = diff::diff(&before, &after);
        uow.update_comment(&after).await?;

        let action = AuditAction::new(Verb::Update, EntityKind::Comment);
        let mutation = Mutation::new(action, after.id, Some(board.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    pub async fn delete_comment(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let (comment, board) = guard::comment(uow.as_mut(), ctx, id, Access::Write).await?;
        uow.delete_comment(comment.id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::Comment);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(board.id))).await
    }
}
