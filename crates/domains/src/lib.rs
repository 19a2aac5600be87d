//! kanban-board/crates/domains/src/lib.rs
//!
//! Entities, ports and the pure ordering/archive/audit logic of the kanban
//! backend. Nothing in here performs I/O.

pub mod archive;
pub mod audit;
pub mod color;
pub mod diff;
pub mod error;
pub mod media;
pub mod models;
pub mod position;
pub mod traits;

// Re-exporting for easier access in other crates
pub use archive::{Patch, Transition};
pub use audit::{AuditAction, EntityKind, LogEntry, Mutation, Verb};
pub use color::{BoardTheme, Rgb};
pub use diff::{Change, Tracked};
pub use error::*;
pub use media::DataUrl;
pub use models::*;
pub use position::{Assignment, Placement, Slot};
pub use traits::*;
