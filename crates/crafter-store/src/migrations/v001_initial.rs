//! v001 -- Initial schema creation.
//!
//! Creates the three document collections: `completed_conversations`,
//! `summarized_conversations` and `processed_conversations`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Completed conversations (one per session)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS completed_conversations (
    session_id    TEXT PRIMARY KEY NOT NULL,
    messages      TEXT NOT NULL,              -- JSON array of messages
    concept_data  TEXT NOT NULL,              -- JSON object keyed by category
    completed_at  TEXT NOT NULL               -- RFC-3339
);

-- ----------------------------------------------------------------
-- Summaries (one per session, overwritten on every save)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS summarized_conversations (
    session_id      TEXT PRIMARY KEY NOT NULL,
    document        TEXT NOT NULL,            -- JSON summary
    saved_at        TEXT NOT NULL,            -- first write
    last_updated_at TEXT NOT NULL             -- every write
);

-- ----------------------------------------------------------------
-- Extractor output (one per conversation id)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS processed_conversations (
    id           TEXT PRIMARY KEY NOT NULL,
    session_id   TEXT NOT NULL,
    document     TEXT NOT NULL,               -- JSON processed conversation
    processed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_processed_session
    ON processed_conversations(session_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
