//! # ChangeDiff
//!
//! Field-level comparison of two snapshots of the same entity. Each entity
//! type declares the scalar fields worth tracking; only fields whose string
//! form differs end up in the diff.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub field: String,
    pub from_value: String,
    pub to_value: String,
}

/// Entities whose updates are diffed into the audit log.
pub trait Tracked {
    /// `(field, value)` pairs, in a stable order.
    fn tracked_fields(&self) -> Vec<(&'static str, String)>;
}

pub fn diff<T: Tracked>(before: &T, after: &T) -> Vec<Change> {
    before
        .tracked_fields()
        .into_iter()
        .zip(after.tracked_fields())
        .filter(|((_, from), (_, to))| from != to)
        .map(|((field, from_value), (_, to_value))| Change {
            field: field.to_string(),
            from_value,
            to_value,
        })
        .collect()
}

/// Serializes a diff the way it is stored in `logs.changes`.
pub fn to_json(changes: &[Change]) -> Result<String> {
    serde_json::to_string(changes).map_err(AppError::internal)
}
