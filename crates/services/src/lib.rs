//! # services
//!
//! Use cases of the kanban API, one service per aggregate. Each call opens a
//! single unit of work on the [`KanbanStore`], checks that the caller owns the
//! board graph it touches, and commits its data change together with the audit
//! log row through [`audit::commit`].

mod audit;
mod graph;
mod guard;

pub mod background;
pub mod board;
pub mod card;
pub mod checklist;
pub mod comment;
pub mod list;
pub mod log;
pub mod user;

#[cfg(test)]
mod fixtures;

use std::sync::Arc;

use domains::traits::{AuthProvider, ImageProcessor, KanbanStore};

pub use background::BackgroundService;
pub use board::BoardService;
pub use card::CardService;
pub use checklist::ChecklistService;
pub use comment::CommentService;
pub use list::ListService;
pub use log::LogService;
pub use user::UserService;

/// Every service, wired to the same store.
#[derive(Clone)]
pub struct KanbanServices {
    pub boards: BoardService,
    pub lists: ListService,
    pub cards: CardService,
    pub comments: CommentService,
    pub checklists: ChecklistService,
    pub backgrounds: BackgroundService,
    pub logs: LogService,
    pub users: UserService,
}

impl KanbanServices {
    pub fn new(store: Arc<dyn KanbanStore>, images: Arc<dyn ImageProcessor>, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            boards: BoardService::new(store.clone()),
            lists: ListService::new(store.clone()),
            cards: CardService::new(store.clone()),
            comments: CommentService::new(store.clone()),
            checklists: ChecklistService::new(store.clone()),
            backgrounds: BackgroundService::new(store.clone(), images),
            logs: LogService::new(store.clone()),
            users: UserService::new(store, auth),
        }
    }
}
