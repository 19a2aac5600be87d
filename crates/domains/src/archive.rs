//! # ArchiveLifecycle
//!
//! Boards, lists and cards are either active (`archived_at = NULL`) or
//! archived. Clients signal the transition through the `archivedAt` field of
//! an update payload; the stored timestamp is always chosen by the server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::audit::Verb;
use crate::position::Placement;

/// A field of an update payload that may be absent, explicitly `null`, or set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Not present in the payload: keep the stored value.
    Absent,
    /// Present as `null`: clear the stored value.
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The value to store given the current one.
    pub fn apply(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Absent => current,
            Self::Null => None,
            Self::Value(v) => Some(v),
        }
    }
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Self::Value)
    }
}

/// Use together with `#[serde(default)]` so a missing key becomes [`Patch::Absent`].
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

/// Epoch zero is accepted on the wire as an alias of `null`.
pub fn is_clear_sentinel(at: &DateTime<Utc>) -> bool {
    at.timestamp() == 0 && at.timestamp_subsec_nanos() == 0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    Archive,
    Restore,
}

impl Transition {
    /// Audit verb for an update that went through this transition.
    pub fn verb(self) -> Verb {
        match self {
            Self::None => Verb::Update,
            Self::Archive => Verb::Archive,
            Self::Restore => Verb::Restore,
        }
    }

    /// Effect on the parent's dense position sequence.
    pub fn placement(self) -> Placement {
        match self {
            Self::None => Placement::Stay,
            Self::Archive => Placement::Leave,
            Self::Restore => Placement::Append,
        }
    }
}

/// Resolves the requested `archivedAt` against the stored one.
///
/// Returns the timestamp to persist and the transition it represents.
/// Archiving an already archived entity keeps the original timestamp.
pub fn resolve(
    current: Option<DateTime<Utc>>,
    requested: Patch<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Transition) {
    let requested = match requested {
        Patch::Value(at) if is_clear_sentinel(&at) => Patch::Null,
        other => other,
    };
    match (current, requested) {
        (current, Patch::Absent) => (current, Transition::None),
        (None, Patch::Null) => (None, Transition::None),
        (Some(_), Patch::Null) => (None, Transition::Restore),
        (None, Patch::Value(_)) => (Some(now), Transition::Archive),
        (Some(at), Patch::Value(_)) => (Some(at), Transition::None),
    }
}
