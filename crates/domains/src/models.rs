//! # Domain Models
//!
//! Stored rows, the nested read views built from them, and the inputs of the
//! mutating operations. Wire names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::archive::Patch;
use crate::audit::LogEntry;
use crate::color::BoardTheme;
use crate::diff::Tracked;
use crate::position::Slot;

/// Who is calling, and in which language errors should be reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: Uuid,
    pub lang: String,
}

impl UserContext {
    pub fn new(user_id: Uuid, lang: impl Into<String>) -> Self {
        Self { user_id, lang: lang.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The part of a user shown next to log entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub background_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: Uuid,
    pub list_id: Uuid,
    pub title: String,
    pub description: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub card_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checklist {
    pub id: Uuid,
    pub card_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: Uuid,
    pub checklist_id: Uuid,
    pub title: String,
    pub position: i32,
    pub checked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A processed background image owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub id: Uuid,
    pub user_id: Uuid,
    /// `data:<mime>;base64,...`
    pub data: String,
    /// Average color, `#rrggbb`.
    pub color: String,
    pub created_at: DateTime<Utc>,
}

// --- Ordering projections ---

impl List {
    pub fn slot(&self) -> Slot {
        Slot::new(self.id, self.position)
    }

    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}

impl Card {
    pub fn slot(&self) -> Slot {
        Slot::new(self.id, self.position)
    }

    pub fn is_active(&self) -> bool {
        self.archived_at.is_none()
    }
}

impl ChecklistItem {
    pub fn slot(&self) -> Slot {
        Slot::new(self.id, self.position)
    }
}

// --- Tracked fields ---

impl Tracked for Board {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("backgroundId", self.background_id.map(|id| id.to_string()).unwrap_or_default()),
        ]
    }
}

impl Tracked for List {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![("title", self.title.clone()), ("position", self.position.to_string())]
    }
}

impl Tracked for Card {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("position", self.position.to_string()),
        ]
    }
}

impl Tracked for Comment {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![("content", self.content.clone())]
    }
}

impl Tracked for Checklist {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![("title", self.title.clone())]
    }
}

impl Tracked for ChecklistItem {
    fn tracked_fields(&self) -> Vec<(&'static str, String)> {
        vec![("title", self.title.clone())]
    }
}

// --- Read views ---

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistView {
    #[serde(flatten)]
    pub checklist: Checklist,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    /// Newest first.
    pub comments: Vec<Comment>,
    /// Alphabetical; items by position then creation.
    pub checklists: Vec<ChecklistView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    #[serde(flatten)]
    pub list: List,
    /// Active cards by position.
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    #[serde(flatten)]
    pub board: Board,
    pub background: Option<Background>,
    /// Present only when the board has a background.
    #[serde(flatten)]
    pub theme: Option<BoardTheme>,
    /// Active lists by position.
    pub lists: Vec<ListView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    #[serde(flatten)]
    pub entry: LogEntry,
    /// Empty when the target no longer exists or has no title.
    pub action_target_title: String,
    pub user: Option<UserSummary>,
}

// --- Inputs ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBoard {
    pub title: String,
    #[serde(default)]
    pub background_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub background_id: Patch<Uuid>,
    #[serde(default)]
    pub archived_at: Patch<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewList {
    pub board_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub archived_at: Patch<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub list_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub archived_at: Patch<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub card_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentUpdate {
    pub id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChecklist {
    pub card_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistUpdate {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChecklistItem {
    pub checklist_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemUpdate {
    pub id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub checked: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBackground {
    /// `data:<mime>;base64,...`
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;

    fn card(title: &str) -> Card {
        let now = Utc::now();
        Card {
            id: Uuid::nil(),
            list_id: Uuid::nil(),
            title: title.into(),
            description: "same".into(),
            position: 1,
            created_at: now,
            updated_at: now,
            archived_at: None,
        }
    }

    #[test]
    fn card_title_change_is_the_only_diff_entry() {
        let changes = diff(&card("old"), &card("new"));
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "title");
        assert_eq!(changes[0].from_value, "old");
        assert_eq!(changes[0].to_value, "new");
    }

    #[test]
    fn board_background_is_tracked_by_id() {
        let now = Utc::now();
        let before = Board {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: "t".into(),
            background_id: None,
            created_at: now,
            updated_at: now,
            archived_at: None,
        };
        let bg = Uuid::new_v4();
        let after = Board { background_id: Some(bg), ..before.clone() };
        let changes = diff(&before, &after);
        assert_eq!(changes[0].field, "backgroundId");
        assert_eq!(changes[0].from_value, "");
        assert_eq!(changes[0].to_value, bg.to_string());
    }

    #[test]
    fn board_view_flattens_theme() {
        let now = Utc::now();
        let view = BoardView {
            board: Board {
                id: Uuid::nil(),
                user_id: Uuid::nil(),
                title: "t".into(),
                background_id: None,
                created_at: now,
                updated_at: now,
                archived_at: None,
            },
            background: None,
            theme: Some(BoardTheme::derive("#000000").unwrap()),
            lists: vec![],
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["menuColorDark"], "#000000");
        assert_eq!(json["listColor"], "#7f7f7f");
        assert!(json["archivedAt"].is_null());
    }

    #[test]
    fn update_payload_keeps_absent_fields_absent() {
        let update: CardUpdate = serde_json::from_str(&format!(r#"{{"id":"{}"}}"#, Uuid::nil())).unwrap();
        assert!(update.title.is_none());
        assert!(update.archived_at.is_absent());
    }
}
