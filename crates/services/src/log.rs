//! # LogService
//!
//! Reads the activity log of a board. Entries outlive their targets, so titles
//! are resolved on read and left empty when the row is gone.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use domains::error::Result;
use domains::models::{LogView, UserSummary};
use domains::traits::{KanbanStore, UnitOfWork};
use domains::{EntityKind, LogEntry, UserContext};

#[derive(Clone)]
pub struct LogService {
    store: Arc<dyn KanbanStore>,
}

impl LogService {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    /// The caller's entries for `board_id`, newest first.
    pub async fn get_logs(&self, ctx: &UserContext, board_id: Uuid) -> Result<Vec<LogView>> {
        let mut uow = self.store.begin().await?;
        let entries = uow.logs_of_board(ctx.user_id, board_id).await?;
        tracing::debug!(board_id = %board_id, count = entries.len(), "loaded board logs");

        let mut users: HashMap<Uuid, Option<UserSummary>> = HashMap::new();
        let mut views = Vec::with_capacity(entries.len());
        for entry in entries {
            let action_target_title = target_title(uow.as_mut(), &entry).await?;
            let user = match users.get(&entry.user_id) {
                Some(known) => known.clone(),
                None => {
                    let found = uow.find_user(entry.user_id).await?.as_ref().map(UserSummary::from);
                    users.insert(entry.user_id, found.clone());
                    found
                }
            };
            views.push(LogView { entry, action_target_title, user });
        }
        Ok(views)
    }
}

async fn target_title(uow: &mut dyn UnitOfWork, entry: &LogEntry) -> Result<String> {
    let id = entry.action_target_id;
    let title = match entry.action.target_kind() {
        EntityKind::Board => uow.find_board(id).await?.map(|b| b.title),
        EntityKind::List => uow.find_list(id).await?.map(|l| l.title),
        EntityKind::Card => uow.find_card(id).await?.map(|c| c.title),
        EntityKind::Checklist => uow.find_checklist(id).await?.map(|c| c.title),
        EntityKind::ChecklistItem => uow.find_checklist_item(id).await?.map(|i| i.title),
        EntityKind::Comment | EntityKind::Background | EntityKind::User => None,
    };
    Ok(title.unwrap_or_default())
}
