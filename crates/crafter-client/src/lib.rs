//! # crafter-client
//!
//! Client side of ConceptCrafter: the conversation state tracker that drives
//! the guided dialog, the summary editor used to review the generated
//! summary, and the HTTP backend both talk through.
//!
//! The view layer is kept outside this crate; `crafter-chat` is a minimal
//! terminal front end over the same types.

pub mod attribution;
pub mod backend;
pub mod config;
pub mod editor;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use attribution::{PromptEchoMatcher, TopicAttribution};
pub use backend::{BackendError, ConversationBackend, HttpBackend};
pub use config::ClientConfig;
pub use editor::{EditError, ListField, OutlinePart, SaveError, SummaryEdit, SummaryEditor, TextField};
pub use tracker::{ConversationTracker, DialogState, SubmitOutcome, TrackerError};
