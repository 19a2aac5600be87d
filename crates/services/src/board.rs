//! # BoardService
//!
//! Boards own an ordered set of lists. Reordering those lists lives here since
//! the board is the parent the reorder is logged against.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Board, BoardUpdate, BoardView, NewBoard};
use domains::position::{apply_explicit_order, parse_id_list};
use domains::traits::{KanbanStore, UnitOfWork};
use domains::{archive, diff, AuditAction, EntityKind, Mutation, Patch, UserContext, Verb};

use crate::guard::{self, Access, FORBIDDEN};
use crate::{audit, graph};

#[derive(Clone)]
pub struct BoardService {
    store: Arc<dyn KanbanStore>,
}

/// A background can only be attached by the user who uploaded it.
async fn check_background(uow: &mut dyn UnitOfWork, ctx: &UserContext, id: Uuid) -> Result<()> {
    let background = uow
        .find_background(id)
        .await?
        .ok_or_else(|| AppError::not_found(EntityKind::Background, id))?;
    if background.user_id != ctx.user_id {
        return Err(AppError::Forbidden(FORBIDDEN));
    }
    Ok(())
}

impl BoardService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    pub async fn get_board(&self, ctx: &UserContext, id: Uuid) -> Result<BoardView> {
        let mut uow = self.store.begin().await?;
        let board = guard::board(uow.as_mut(), ctx, id, Access::Read).await?;
        tracing::debug!(board_id = %id, "loading board");
        graph::board_view(uow.as_mut(), board).await
    }

    /// The caller's boards, either active or archived.
    pub async fn get_boards(&self, ctx: &UserContext, archived: bool) -> Result<Vec<BoardView>> {
        let mut uow = self.store.begin().await?;
        let boards = uow.boards_of_user(ctx.user_id, archived).await?;
        let mut views = Vec::with_capacity(boards.len());
        for board in boards {
            views.push(graph::board_view(uow.as_mut(), board).await?);
        }
        Ok(views)
    }

    pub async fn create_board(&self, ctx: &UserContext, input: NewBoard) -> Result<Uuid> {
        let title = guard::required("title", &input.title)?;
        let mut uow = self.store.begin().await?;
        if let Some(bg) = input.background_id {
            check_background(uow.as_mut(), ctx, bg).await?;
        }

        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            user_id: ctx.user_id,
            title,
            background_id: input.background_id,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        uow.insert_board(&board).await?;

        let action = AuditAction::new(Verb::Create, EntityKind::Board);
        audit::commit(uow, ctx, Mutation::new(action, board.id, Some(board.id))).await?;
        Ok(board.id)
    }

    pub async fn update_board(&self, ctx: &UserContext, input: BoardUpdate) -> Result<()> {
        let mut uow = self.store.begin().await?;
        let before = guard::board(uow.as_mut(), ctx, input.id, Access::Write).await?;
        let mut after = before.clone();

        if let Some(title) = input.title.as_deref() {
            after.title = guard::required("title", title)?;
        }
        if let Patch::Value(bg) = input.background_id {
            check_background(uow.as_mut(), ctx, bg).await?;
        }
        after.background_id = input.background_id.apply(before.background_id);

        let now = Utc::now();
        let (archived_at, transition) = archive::resolve(before.archived_at, input.archived_at, now);
        after.archived_at = archived_at;
        after.updated_at = now;

        let changes = diff::diff(&before, &after);
        uow.update_board(&after).await?;

        let action = AuditAction::new(transition.verb(), EntityKind::Board);
        let mutation = Mutation::new(action, after.id, Some(after.id)).with_changes(changes);
        audit::commit(uow, ctx, mutation).await
    }

    /// Removes the board and everything under it, archived lists and cards included.
    pub async fn delete_board(&self, ctx: &UserContext, id: Uuid) -> Result<()> {
        let mut uow = self.store.begin().await?;
        guard::board(uow.as_mut(), ctx, id, Access::Write).await?;

        for list in uow.lists_of_board(id).await? {
            graph::delete_list_tree(uow.as_mut(), list.id).await?;
        }
        uow.delete_board(id).await?;

        let action = AuditAction::new(Verb::Delete, EntityKind::Board);
        audit::commit(uow, ctx, Mutation::new(action, id, Some(id))).await
    }

    /// Applies `idsordered` to the board's active lists.
    pub async fn reorder_lists(&self, ctx: &UserContext, board_id: Uuid, ids_ordered: &str) -> Result<()> {
        let ids = parse_id_list(ids_ordered)?;
        let mut uow = self.store.begin().await?;
        guard::board(uow.as_mut(), ctx, board_id, Access::Write).await?;

        let active = graph::active_list_slots(uow.as_mut(), board_id).await?;
        for id in &ids {
            if !active.iter().any(|s| s.id == *id) && uow.find_list(*id).await?.is_none() {
                return Err(AppError::not_found(EntityKind::List, id));
            }
        }
        let assignments = apply_explicit_order(&ids, &active, EntityKind::List, EntityKind::Board, board_id)?;
        graph::write_list_positions(uow.as_mut(), &assignments).await?;

        let action = AuditAction::new(Verb::Reorder, EntityKind::List);
        audit::commit(uow, ctx, Mutation::new(action, board_id, Some(board_id))).await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use domains::error::ErrorKind;
    use domains::models::{Background, NewCard, NewComment};

    use super::*;
    use crate::fixtures::Harness;

    async fn seed_background(h: &Harness, ctx: &UserContext, color: &str) -> Uuid {
        let background = Background {
            id: Uuid::new_v4(),
            user_id: ctx.user_id,
            data: "data:image/png;base64,AAAA".into(),
            color: color.into(),
            created_at: Utc::now(),
        };
        let mut uow = h.store.begin().await.unwrap();
        uow.insert_background(&background).await.unwrap();
        uow.commit().await.unwrap();
        background.id
    }

    #[tokio::test]
    async fn other_users_are_forbidden() {
        let h = Harness::new();
        let owner = h.user("ada@example.com").await;
        let intruder = h.user("eve@example.com").await;
        let board = h.board(&owner).await;
        let list = h.lists(&owner, board, &["Todo"]).await[0];

        let err = h.services.boards.get_board(&intruder, board).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        let err = h.services.lists.get_list(&intruder, list).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let input = NewCard { list_id: list, title: "sneaky".into(), description: String::new() };
        let err = h.services.cards.create_card(&intruder, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.message_key(), "Forbidden");
        assert_eq!(h.store.row_counts().await.cards, 0);
    }

    #[tokio::test]
    async fn unknown_board_is_not_found() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let err = h.services.boards.get_board(&ctx, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.message_key(), "BoardNotFound");
    }

    #[tokio::test]
    async fn theme_is_derived_from_the_background_color() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let background = seed_background(&h, &ctx, "#204060").await;
        let input = NewBoard { title: "Themed".into(), background_id: Some(background) };
        let board = h.services.boards.create_board(&ctx, input).await.unwrap();

        let view = h.services.boards.get_board(&ctx, board).await.unwrap();
        let theme = view.theme.unwrap();
        assert_eq!(theme.menu_color_dark, "#102030");
        assert_eq!(theme.list_color, "#8f9faf");

        let plain = h.board(&ctx).await;
        assert!(h.services.boards.get_board(&ctx, plain).await.unwrap().theme.is_none());
    }

    #[tokio::test]
    async fn someone_elses_background_cannot_be_attached() {
        let h = Harness::new();
        let ada = h.user("ada@example.com").await;
        let eve = h.user("eve@example.com").await;
        let background = seed_background(&h, &eve, "#000000").await;

        let input = NewBoard { title: "Mine".into(), background_id: Some(background) };
        let err = h.services.boards.create_board(&ada, input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let input = NewBoard { title: "Mine".into(), background_id: Some(Uuid::new_v4()) };
        let err = h.services.boards.create_board(&ada, input).await.unwrap_err();
        assert_eq!(err.message_key(), "BackgroundNotFound");
    }

    #[tokio::test]
    async fn background_change_is_diffed() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let background = seed_background(&h, &ctx, "#204060").await;
        let board = h.board(&ctx).await;

        let input = BoardUpdate { id: board, background_id: Patch::Value(background), ..Default::default() };
        assert_ok!(h.services.boards.update_board(&ctx, input).await);

        let last = h.store.all_logs().await.pop().unwrap();
        let expected = format!(r#"[{{"field":"backgroundId","fromValue":"","toValue":"{background}"}}]"#);
        assert_eq!(last.changes.as_deref(), Some(expected.as_str()));
    }

    #[tokio::test]
    async fn archived_boards_are_listed_separately() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let kept = h.board(&ctx).await;
        let shelved = h.board(&ctx).await;

        let input = BoardUpdate { id: shelved, archived_at: Patch::Value(Utc::now()), ..Default::default() };
        h.services.boards.update_board(&ctx, input).await.unwrap();

        let active = h.services.boards.get_boards(&ctx, false).await.unwrap();
        let archived = h.services.boards.get_boards(&ctx, true).await.unwrap();
        assert_eq!(active.iter().map(|b| b.board.id).collect::<Vec<_>>(), vec![kept]);
        assert_eq!(archived.iter().map(|b| b.board.id).collect::<Vec<_>>(), vec![shelved]);
        assert_eq!(h.store.all_logs().await.pop().unwrap().action.to_string(), "archiveboard");
    }

    #[tokio::test]
    async fn delete_removes_the_whole_graph() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let lists = h.lists(&ctx, board, &["Todo", "Done"]).await;
        let cards = h.cards(&ctx, lists[0], &["a", "b"]).await;
        h.cards(&ctx, lists[1], &["c"]).await;
        let comment = NewComment { card_id: cards[0], content: "note".into() };
        h.services.comments.create_comment(&ctx, comment).await.unwrap();

        assert_ok!(h.services.boards.delete_board(&ctx, board).await);

        let counts = h.store.row_counts().await;
        assert_eq!((counts.boards, counts.lists, counts.cards, counts.comments), (0, 0, 0, 0));
        assert_err!(h.services.boards.get_board(&ctx, board).await);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "deleteboard");
        assert_eq!(last.board_id, Some(board));
    }

    #[tokio::test]
    async fn reorder_lists_is_logged_against_the_board() {
        let h = Harness::new();
        let ctx = h.user("ada@example.com").await;
        let board = h.board(&ctx).await;
        let l = h.lists(&ctx, board, &["A", "B", "C"]).await;

        let csv = format!("{},{},{}", l[1], l[2], l[0]);
        assert_ok!(h.services.boards.reorder_lists(&ctx, board, &csv).await);

        let view = h.services.boards.get_board(&ctx, board).await.unwrap();
        let order: Vec<(Uuid, i32)> = view.lists.iter().map(|v| (v.list.id, v.list.position)).collect();
        assert_eq!(order, vec![(l[1], 1), (l[2], 2), (l[0], 3)]);

        let last = h.store.all_logs().await.pop().unwrap();
        assert_eq!(last.action.to_string(), "reorderlists");
        assert_eq!(last.action_target_id, board);
    }
}
