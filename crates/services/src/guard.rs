//! Ownership resolution.
//!
//! Every entity of a board graph is reachable from exactly one board, and only
//! that board's owner may read or change it. The resolvers below walk
//! `item -> checklist -> card -> list -> board`, check the owner, and for
//! writes take the board lock before re-reading the target.

use uuid::Uuid;

use domains::error::{AppError, Result};
use domains::models::{Board, Card, Checklist, ChecklistItem, Comment, List};
use domains::traits::UnitOfWork;
use domains::{EntityKind, UserContext};

pub(crate) const FORBIDDEN: &str = "Forbidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Access {
    Read,
    /// Locks the owning board for the rest of the unit of work.
    Write,
}

pub(crate) async fn board(uow: &mut dyn UnitOfWork, ctx: &UserContext, id: Uuid, access: Access) -> Result<Board> {
    let board = match access {
        Access::Read => uow.find_board(id).await?,
        Access::Write => uow.lock_board(id).await?,
    }
    .ok_or_else(|| AppError::not_found(EntityKind::Board, id))?;

    if board.user_id != ctx.user_id {
        tracing::warn!(board_id = %id, user_id = %ctx.user_id, "board owned by another user");
        return Err(AppError::Forbidden(FORBIDDEN));
    }
    Ok(board)
}

pub(crate) async fn list(
    uow: &mut dyn UnitOfWork,
    ctx: &UserContext,
    id: Uuid,
    access: Access,
) -> Result<(List, Board)> {
    let missing = || AppError::not_found(EntityKind::List, id);
    let list = uow.find_list(id).await?.ok_or_else(missing)?;
    let board = board(uow, ctx, list.board_id, access).await?;
    let list = match access {
        Access::Read => list,
        Access::Write => uow.find_list(id).await?.ok_or_else(missing)?,
    };
    Ok((list, board))
}

pub(crate) async fn card(
    uow: &mut dyn UnitOfWork,
    ctx: &UserContext,
    id: Uuid,
    access: Access,
) -> Result<(Card, Board)> {
    let missing = || AppError::not_found(EntityKind::Card, id);
    let card = uow.find_card(id).await?.ok_or_else(missing)?;
    let (_, board) = list(uow, ctx, card.list_id, access).await?;
    let card = match access {
        Access::Read => card,
        Access::Write => uow.find_card(id).await?.ok_or_else(missing)?,
    };
    Ok((card, board))
}

pub(crate) async fn comment(
    uow: &mut dyn UnitOfWork,
    ctx: &UserContext,
    id: Uuid,
    access: Access,
) -> Result<(Comment, Board)> {
    let missing = || AppError::not_found(EntityKind::Comment, id);
    let comment = uow.find_comment(id).await?.ok_or_else(missing)?;
    let (_, board) = card(uow, ctx, comment.card_id, access).await?;
    let comment = match access {
        Access::Read => comment,
        Access::Write => uow.find_comment(id).await?.ok_or_else(missing)?,
    };
    Ok((comment, board))
}

pub(crate) async fn checklist(
    uow: &mut dyn UnitOfWork,
    ctx: &UserContext,
    id: Uuid,
    access: Access,
) -> Result<(Checklist, Board)> {
    let missing = || AppError::not_found(EntityKind::Checklist, id);
    let checklist = uow.find_checklist(id).await?.ok_or_else(missing)?;
    let (_, board) = card(uow, ctx, checklist.card_id, access).await?;
    let checklist = match access {
        Access::Read => checklist,
        Access::Write => uow.find_checklist(id).await?.ok_or_else(missing)?,
    };
    Ok((checklist, board))
}

pub(crate) async fn checklist_item(
    uow: &mut dyn UnitOfWork,
    ctx: &UserContext,
    id: Uuid,
    access: Access,
) -> Result<(ChecklistItem, Board)> {
    let missing = || AppError::not_found(EntityKind::ChecklistItem, id);
    let item = uow.find_checklist_item(id).await?.ok_or_else(missing)?;
    let (_, board) = checklist(uow, ctx, item.checklist_id, access).await?;
    let item = match access {
        Access::Read => item,
        Access::Write => uow.find_checklist_item(id).await?.ok_or_else(missing)?,
    };
    Ok((item, board))
}

/// Rejects blank titles and contents.
pub(crate) fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}
