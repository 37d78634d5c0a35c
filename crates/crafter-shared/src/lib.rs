//! # crafter-shared
//!
//! Types shared by the ConceptCrafter server, store and client crates:
//! the topic catalog, chat messages, the accumulated concept record, the
//! structured video summary, HTTP payloads, timestamp normalization and the
//! keyword-based conversation extractor.

pub mod catalog;
pub mod constants;
pub mod error;
pub mod extract;
pub mod protocol;
pub mod summary;
pub mod timestamp;
pub mod types;

pub use catalog::{Category, Topic, CATALOG};
pub use error::SharedError;
pub use summary::VideoConceptSummary;
pub use types::{ConceptData, Message, MessageId, Role, SessionId};
