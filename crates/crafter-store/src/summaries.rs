//! The `summarized_conversations` collection.
//!
//! A summary document is upserted on every save. The first-write time is
//! kept across saves; the last-write time strictly increases.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

use crafter_shared::timestamp;
use crafter_shared::VideoConceptSummary;

use crate::database::{not_found, Database};
use crate::error::Result;

impl Database {
    /// Upsert a summary and return the stored copy with its timestamps.
    ///
    /// `savedAt` comes from the incoming document when present, otherwise
    /// from the existing row, otherwise it is now.
    pub fn save_summary(
        &self,
        session_id: &str,
        summary: &VideoConceptSummary,
    ) -> Result<VideoConceptSummary> {
        let previous: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT saved_at, last_updated_at
                 FROM summarized_conversations WHERE session_id = ?1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let previous = match previous {
            Some((saved, updated)) => Some((parse(&saved)?, parse(&updated)?)),
            None => None,
        };

        let now = Utc::now();
        let saved_at = summary
            .saved_at
            .or(previous.map(|(saved, _)| saved))
            .unwrap_or(now);
        let last_updated_at = match previous {
            Some((_, updated)) if now <= updated => updated + Duration::microseconds(1),
            _ => now,
        };

        let mut document = summary.clone();
        document.session_id = Some(session_id.to_string());
        document.saved_at = Some(saved_at);
        document.last_updated_at = Some(last_updated_at);

        self.conn().execute(
            "INSERT INTO summarized_conversations (session_id, document, saved_at, last_updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(session_id) DO UPDATE SET
                 document = excluded.document,
                 saved_at = excluded.saved_at,
                 last_updated_at = excluded.last_updated_at",
            params![
                session_id,
                serde_json::to_string(&document)?,
                timestamp::to_wire(&saved_at),
                timestamp::to_wire(&last_updated_at),
            ],
        )?;

        tracing::debug!(session = session_id, "summary stored");

        self.get_summary(session_id)
    }

    pub fn get_summary(&self, session_id: &str) -> Result<VideoConceptSummary> {
        let document: String = self
            .conn()
            .query_row(
                "SELECT document FROM summarized_conversations WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(not_found)?;

        Ok(serde_json::from_str(&document)?)
    }
}

fn parse(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}
