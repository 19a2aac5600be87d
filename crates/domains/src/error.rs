//! # AppError
//!
//! Centralized error handling for the kanban core.
//! Every failure is classified into an [`ErrorKind`] and carries a message key
//! the boundary layer hands to the `Translator`. HTTP status mapping lives in
//! `api-adapters`, never here.

use thiserror::Error;
use uuid::Uuid;

use crate::audit::EntityKind;

/// The classification the boundary layer maps to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    ValidationFailed,
    UnknownSibling,
    Internal,
}

/// The primary error type for all domain and service operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Entity or parent missing (e.g., Board, List, Card)
    #[error("{0} not found with ID {1}")]
    NotFound(EntityKind, String),

    /// Ownership mismatch, or a background still referenced by a board.
    /// Holds the message key.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Malformed payload, path/body id mismatch, empty reorder list...
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A reorder payload references an id that is not an active child of the parent.
    #[error("{child} {id} is not an active child of {parent} {parent_id}")]
    UnknownSibling {
        child: EntityKind,
        id: Uuid,
        parent: EntityKind,
        parent_id: Uuid,
    },

    /// A stored background color is not `#rrggbb`.
    #[error("invalid color format: {0:?}")]
    InvalidColorFormat(String),

    /// Infrastructure failure (e.g., DB down, image decode, audit write)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(kind: EntityKind, id: impl ToString) -> Self {
        Self::NotFound(kind, id.to_string())
    }

    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(..) => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::ValidationError(_) => ErrorKind::ValidationFailed,
            Self::UnknownSibling { .. } => ErrorKind::UnknownSibling,
            Self::InvalidColorFormat(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Key looked up in the message catalog for the user-facing text.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::NotFound(kind, _) => kind.not_found_key(),
            Self::Forbidden(key) => key,
            Self::ValidationError(_) => "InvalidPayload",
            Self::UnknownSibling { .. } => "UnknownSibling",
            Self::InvalidColorFormat(_) | Self::Internal(_) => "InternalError",
        }
    }
}

/// A specialized Result type for kanban logic.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_failures_classify_as_internal() {
        let err = AppError::InvalidColorFormat("zz".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message_key(), "InternalError");
    }

    #[test]
    fn not_found_key_follows_entity() {
        let err = AppError::not_found(EntityKind::ChecklistItem, Uuid::nil());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message_key(), "ChecklistItemNotFound");
    }
}
