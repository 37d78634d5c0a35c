//! # crafter-store
//!
//! Document storage for ConceptCrafter, backed by SQLite.
//!
//! Three logical collections are kept, each keyed by a string id and holding
//! JSON documents: completed conversations, summaries and processed
//! (extractor) results. The crate exposes a synchronous `Database` handle
//! wrapping a `rusqlite::Connection` with typed helpers per collection.

pub mod conversations;
pub mod database;
pub mod migrations;
pub mod models;
pub mod processed;
pub mod summaries;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
