//! # Core Traits (Ports)
//!
//! Adapters implement these traits; services only ever see the trait objects.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::audit::LogEntry;
use crate::error::Result;
use crate::media::DataUrl;
use crate::models::{Background, Board, Card, Checklist, ChecklistItem, Comment, List, User};

/// Entry point of the persistence layer.
#[async_trait]
pub trait KanbanStore: Send + Sync {
    /// Opens a transaction. Dropping the returned unit of work without
    /// calling [`UnitOfWork::commit`] rolls it back.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    /// Cheap connectivity probe for liveness checks.
    async fn ping(&self) -> Result<()>;
}

/// Every read and write of one service call, inside a single transaction.
///
/// Collection readers return archived rows as well; callers filter with
/// `is_active()` where the active set matters.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Loads the board and holds a write lock on it until the transaction ends.
    /// Every mutation under a board takes this lock before reading siblings.
    async fn lock_board(&mut self, id: Uuid) -> Result<Option<Board>>;

    // User Operations
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>>;
    async fn insert_user(&mut self, user: &User) -> Result<()>;

    // Board Operations
    async fn find_board(&mut self, id: Uuid) -> Result<Option<Board>>;
    /// Boards owned by `user_id`, active or archived, oldest first.
    async fn boards_of_user(&mut self, user_id: Uuid, archived: bool) -> Result<Vec<Board>>;
    async fn count_boards_with_background(&mut self, background_id: Uuid) -> Result<u64>;
    async fn insert_board(&mut self, board: &Board) -> Result<()>;
    async fn update_board(&mut self, board: &Board) -> Result<()>;
    async fn delete_board(&mut self, id: Uuid) -> Result<()>;

    // List Operations
    async fn find_list(&mut self, id: Uuid) -> Result<Option<List>>;
    /// Ordered by position.
    async fn lists_of_board(&mut self, board_id: Uuid) -> Result<Vec<List>>;
    async fn insert_list(&mut self, list: &List) -> Result<()>;
    async fn update_list(&mut self, list: &List) -> Result<()>;
    async fn set_list_position(&mut self, id: Uuid, position: i32) -> Result<()>;
    async fn delete_list(&mut self, id: Uuid) -> Result<()>;

    // Card Operations
    async fn find_card(&mut self, id: Uuid) -> Result<Option<Card>>;
    /// Ordered by position.
    async fn cards_of_list(&mut self, list_id: Uuid) -> Result<Vec<Card>>;
    async fn insert_card(&mut self, card: &Card) -> Result<()>;
    async fn update_card(&mut self, card: &Card) -> Result<()>;
    async fn set_card_position(&mut self, id: Uuid, position: i32) -> Result<()>;
    async fn delete_card(&mut self, id: Uuid) -> Result<()>;

    // Comment Operations
    async fn find_comment(&mut self, id: Uuid) -> Result<Option<Comment>>;
    /// Newest first.
    async fn comments_of_card(&mut self, card_id: Uuid) -> Result<Vec<Comment>>;
    async fn insert_comment(&mut self, comment: &Comment) -> Result<()>;
    async fn update_comment(&mut self, comment: &Comment) -> Result<()>;
    async fn delete_comment(&mut self, id: Uuid) -> Result<()>;

    // Checklist Operations
    async fn find_checklist(&mut self, id: Uuid) -> Result<Option<Checklist>>;
    /// Alphabetical by title, then creation.
    async fn checklists_of_card(&mut self, card_id: Uuid) -> Result<Vec<Checklist>>;
    async fn insert_checklist(&mut self, checklist: &Checklist) -> Result<()>;
    async fn update_checklist(&mut self, checklist: &Checklist) -> Result<()>;
    async fn delete_checklist(&mut self, id: Uuid) -> Result<()>;

    async fn find_checklist_item(&mut self, id: Uuid) -> Result<Option<ChecklistItem>>;
    /// Ordered by position, then creation.
    async fn items_of_checklist(&mut self, checklist_id: Uuid) -> Result<Vec<ChecklistItem>>;
    async fn insert_checklist_item(&mut self, item: &ChecklistItem) -> Result<()>;
    async fn update_checklist_item(&mut self, item: &ChecklistItem) -> Result<()>;
    async fn set_checklist_item_position(&mut self, id: Uuid, position: i32) -> Result<()>;
    async fn delete_checklist_item(&mut self, id: Uuid) -> Result<()>;

    // Background Operations
    async fn find_background(&mut self, id: Uuid) -> Result<Option<Background>>;
    async fn backgrounds_of_user(&mut self, user_id: Uuid) -> Result<Vec<Background>>;
    async fn insert_background(&mut self, background: &Background) -> Result<()>;
    async fn delete_background(&mut self, id: Uuid) -> Result<()>;

    // Log Operations
    async fn insert_log(&mut self, entry: &LogEntry) -> Result<()>;
    /// Entries written by `user_id` against `board_id`, newest first.
    async fn logs_of_board(&mut self, user_id: Uuid, board_id: Uuid) -> Result<Vec<LogEntry>>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Result of processing an uploaded background.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    /// Resized image, re-encoded in the upload's format.
    pub image: DataUrl,
    /// `#rrggbb`
    pub average_color: String,
}

/// Decoding, resizing and color extraction for background uploads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ImageProcessor: Send + Sync {
    async fn process(&self, upload: DataUrl) -> Result<ProcessedImage>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Password hashing, token issuance and identity extraction.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String>;
    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool>;
    fn issue_tokens(&self, user: &User) -> Result<TokenPair>;
    /// Resolves a bearer token to the user id it was issued for.
    fn identify(&self, bearer: &str) -> Result<Uuid>;
}

/// Message catalog lookup. Unknown keys come back unchanged.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Translator: Send + Sync {
    fn translate(&self, lang: &str, key: &str) -> String;
}
