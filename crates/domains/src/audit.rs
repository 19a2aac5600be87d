//! # Audit vocabulary
//!
//! Action verbs are a closed set of `Verb × EntityKind` pairs. They are
//! persisted as the lowercase strings clients already know
//! (`createboard`, `archivelist`, `reordercards`, ...).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::diff::Change;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Board,
    List,
    Card,
    Comment,
    Checklist,
    ChecklistItem,
    Background,
    User,
}

impl EntityKind {
    const ALL: [EntityKind; 8] = [
        Self::Board,
        Self::List,
        Self::Card,
        Self::Comment,
        Self::Checklist,
        Self::ChecklistItem,
        Self::Background,
        Self::User,
    ];

    /// Lowercase name used inside action strings.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Board => "board",
            Self::List => "list",
            Self::Card => "card",
            Self::Comment => "comment",
            Self::Checklist => "checklist",
            Self::ChecklistItem => "checklistitem",
            Self::Background => "background",
            Self::User => "user",
        }
    }

    /// The kind that owns the ordered collection this kind lives in.
    pub fn parent(self) -> Option<EntityKind> {
        match self {
            Self::List => Some(Self::Board),
            Self::Card => Some(Self::List),
            Self::Comment | Self::Checklist => Some(Self::Card),
            Self::ChecklistItem => Some(Self::Checklist),
            Self::Board | Self::Background | Self::User => None,
        }
    }

    pub fn not_found_key(self) -> &'static str {
        match self {
            Self::Board => "BoardNotFound",
            Self::List => "ListNotFound",
            Self::Card => "CardNotFound",
            Self::Comment => "CommentNotFound",
            Self::Checklist => "ChecklistNotFound",
            Self::ChecklistItem => "ChecklistItemNotFound",
            Self::Background => "BackgroundNotFound",
            Self::User => "UserNotFound",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Create,
    Update,
    Archive,
    Restore,
    Delete,
    Reorder,
}

impl Verb {
    const ALL: [Verb; 6] = [
        Self::Create,
        Self::Update,
        Self::Archive,
        Self::Restore,
        Self::Delete,
        Self::Reorder,
    ];

    fn prefix(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Archive => "archive",
            Self::Restore => "restore",
            Self::Delete => "delete",
            Self::Reorder => "reorder",
        }
    }
}

/// What happened to which kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct AuditAction {
    pub verb: Verb,
    pub kind: EntityKind,
}

impl AuditAction {
    pub const fn new(verb: Verb, kind: EntityKind) -> Self {
        Self { verb, kind }
    }

    /// Kind of the row `action_target_id` points at.
    ///
    /// A reorder is logged against the parent whose children moved.
    pub fn target_kind(self) -> EntityKind {
        match self.verb {
            Verb::Reorder => self.kind.parent().unwrap_or(self.kind),
            _ => self.kind,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb.prefix())?;
        f.write_str(self.kind.slug())?;
        if self.verb == Verb::Reorder {
            f.write_str("s")?;
        }
        Ok(())
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for verb in Verb::ALL {
            let Some(rest) = s.strip_prefix(verb.prefix()) else {
                continue;
            };
            let rest = if verb == Verb::Reorder {
                match rest.strip_suffix('s') {
                    Some(r) => r,
                    None => continue,
                }
            } else {
                rest
            };
            if let Some(kind) = EntityKind::ALL.into_iter().find(|k| k.slug() == rest) {
                return Ok(Self::new(verb, kind));
            }
        }
        Err(AppError::internal(format!("unknown audit action {s:?}")))
    }
}

impl From<AuditAction> for String {
    fn from(action: AuditAction) -> Self {
        action.to_string()
    }
}

impl TryFrom<String> for AuditAction {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The outcome of one mutating call, persisted by the audited commit.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub action: AuditAction,
    pub target_id: Uuid,
    /// `None` for board-independent actions (backgrounds).
    pub board_id: Option<Uuid>,
    pub changes: Option<Vec<Change>>,
}

impl Mutation {
    pub fn new(action: AuditAction, target_id: Uuid, board_id: Option<Uuid>) -> Self {
        Self { action, target_id, board_id, changes: None }
    }

    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = Some(changes);
        self
    }
}

/// Immutable record of one state-changing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub board_id: Option<Uuid>,
    pub action: AuditAction,
    pub action_target_id: Uuid,
    /// JSON array of `{field, fromValue, toValue}`; opaque to readers.
    pub changes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LogEntry {
    /// Builds the row for `mutation`, attributed to `user_id`.
    pub fn record(user_id: Uuid, mutation: Mutation) -> crate::Result<Self> {
        let changes = mutation
            .changes
            .as_deref()
            .map(crate::diff::to_json)
            .transpose()?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            board_id: mutation.board_id,
            action: mutation.action,
            action_target_id: mutation.target_id,
            changes,
            created_at: Utc::now(),
        })
    }
}
