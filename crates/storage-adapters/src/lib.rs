//! kanban-board/crates/storage-adapters/src/lib.rs
//!
//! Persistence and media adapters for the `domains` ports.

pub mod media;
pub mod memory;
#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use media::ImageResizer;
pub use memory::{InMemoryStore, RowCounts};
#[cfg(feature = "db-postgres")]
pub use postgres::{PoolSettings, PostgresStore};
