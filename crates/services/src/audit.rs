//! The audited commit: the single place where a mutation's log row is written.
//!
//! Services never call `UnitOfWork::commit` directly for mutations. They hand
//! the unit of work and the [`Mutation`] they performed to [`commit`], which
//! writes the log entry in the same transaction and commits both, or neither.

use domains::error::Result;
use domains::traits::UnitOfWork;
use domains::{LogEntry, Mutation, UserContext};

pub(crate) async fn commit(mut uow: Box<dyn UnitOfWork>, ctx: &UserContext, mutation: Mutation) -> Result<()> {
    let entry = LogEntry::record(ctx.user_id, mutation)?;
    uow.insert_log(&entry).await?;
    uow.commit().await?;
    tracing::info!(
        action = %entry.action,
        target_id = %entry.action_target_id,
        board_id = ?entry.board_id,
        user_id = %ctx.user_id,
        "mutation committed"
    );
    Ok(())
}
