//! The `completed_conversations` collection.

use chrono::{DateTime, Utc};
use rusqlite::params;

use crafter_shared::timestamp;
use crafter_shared::{ConceptData, Message};

use crate::database::{not_found, Database};
use crate::error::Result;
use crate::models::StoredConversation;

impl Database {
    /// Store a finished conversation, replacing any earlier document for the
    /// same session.
    pub fn save_conversation(
        &self,
        session_id: &str,
        messages: &[Message],
        concept_data: &ConceptData,
    ) -> Result<StoredConversation> {
        let completed_at = Utc::now();

        self.conn().execute(
            "INSERT OR REPLACE INTO completed_conversations
                 (session_id, messages, concept_data, completed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                serde_json::to_string(messages)?,
                serde_json::to_string(concept_data)?,
                timestamp::to_wire(&completed_at),
            ],
        )?;

        tracing::debug!(session = session_id, messages = messages.len(), "conversation stored");

        Ok(StoredConversation {
            session_id: session_id.to_string(),
            messages: messages.to_vec(),
            concept_data: concept_data.clone(),
            completed_at,
        })
    }

    pub fn get_conversation(&self, session_id: &str) -> Result<StoredConversation> {
        let (messages, concept_data, completed_at): (String, String, String) = self
            .conn()
            .query_row(
                "SELECT messages, concept_data, completed_at
                 FROM completed_conversations WHERE session_id = ?1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(not_found)?;

        Ok(StoredConversation {
            session_id: session_id.to_string(),
            messages: serde_json::from_str(&messages)?,
            concept_data: serde_json::from_str(&concept_data)?,
            completed_at: DateTime::parse_from_rfc3339(&completed_at)?.with_timezone(&Utc),
        })
    }
}
