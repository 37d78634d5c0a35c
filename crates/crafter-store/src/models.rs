//! Records read back from the document collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crafter_shared::timestamp;
use crafter_shared::{ConceptData, Message};

// ---------------------------------------------------------------------------
// Completed conversation
// ---------------------------------------------------------------------------

/// A finished dialog as persisted when the completion marker was seen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoredConversation {
    /// Session the dialog belonged to; also the document key.
    pub session_id: String,
    /// Full display history, greeting included.
    pub messages: Vec<Message>,
    /// Final accumulated answers per category.
    pub concept_data: ConceptData,
    /// Server-assigned time of the save.
    #[serde(with = "timestamp::flexible")]
    pub completed_at: DateTime<Utc>,
}
