//! The `processed_conversations` collection.

use chrono::Utc;
use rusqlite::params;

use crafter_shared::extract::ProcessedConversation;
use crafter_shared::timestamp;

use crate::database::{not_found, Database};
use crate::error::Result;

impl Database {
    pub fn save_processed(&self, processed: &ProcessedConversation) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO processed_conversations (id, session_id, document, processed_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                processed.id,
                processed.session_id,
                serde_json::to_string(processed)?,
                timestamp::to_wire(&Utc::now()),
            ],
        )?;
        Ok(())
    }

    pub fn get_processed(&self, id: &str) -> Result<ProcessedConversation> {
        let document: String = self
            .conn()
            .query_row(
                "SELECT document FROM processed_conversations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(not_found)?;

        Ok(serde_json::from_str(&document)?)
    }
}

#[cfg(test)]
mod tests {
    use crafter_shared::extract::{process_conversation, CompletedConversation};
    use crafter_shared::{ConceptData, Message};

    use super::*;

    #[test]
    fn test_save_and_get_processed() {
        let db = Database::open_in_memory().unwrap();
        let processed = process_conversation(&CompletedConversation {
            id: "abc".into(),
            session_id: "abc".into(),
            completed_at: Some(Utc::now()),
            concept_data: ConceptData::new(),
            messages: vec![Message::user("ok"), Message::user("A calm, emotional piece")],
        });

        db.save_processed(&processed).unwrap();
        let loaded = db.get_processed("abc").unwrap();

        assert_eq!(loaded.processed_messages.len(), 1);
        assert_eq!(loaded.semantic_tags, processed.semantic_tags);
        assert_eq!(loaded.completed_at, processed.completed_at);
    }
}
