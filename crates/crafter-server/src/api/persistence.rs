use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::{error, info};

use crafter_shared::extract::{process_conversation as extract, CompletedConversation, ProcessedConversation};
use crafter_shared::protocol::SaveResponse;
use crafter_shared::{ConceptData, Message, VideoConceptSummary};

use super::{json_body, required, required_string, AppState};
use crate::error::ServerError;

const SESSION_ID_REQUIRED: &str = "Invalid payload: \"sessionId\" string is required.";

pub(super) async fn save_conversation(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse<()>>, ServerError> {
    if state.store.is_none() {
        return Err(ServerError::StoreUnavailable);
    }
    let body = json_body(payload)?;

    let session_id = required_string(&body, "sessionId", SESSION_ID_REQUIRED)?;
    if !body.get("messages").is_some_and(Value::is_array) {
        return Err(ServerError::bad_request("Invalid payload: \"messages\" array is required."));
    }
    let messages: Vec<Message> =
        required(&body, "messages", "Invalid payload: \"messages\" array is required.")?;
    let concept_data: ConceptData = required(
        &body,
        "conceptData",
        "Invalid payload: \"conceptData\" object is required.",
    )?;

    let saved = {
        let db = state.store()?;
        db.save_conversation(&session_id, &messages, &concept_data)
    };

    match saved {
        Ok(_) => {
            info!(session = %session_id, messages = messages.len(), "conversation saved");
            Ok(Json(SaveResponse::saved("Conversation saved successfully.", None)))
        }
        Err(e) => {
            error!(session = %session_id, error = %e, "failed to save conversation");
            Err(ServerError::Persistence {
                error: "Failed to save conversation.",
                details: e.to_string(),
            })
        }
    }
}

pub(super) async fn save_summary(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse<VideoConceptSummary>>, ServerError> {
    if state.store.is_none() {
        return Err(ServerError::StoreUnavailable);
    }
    let body = json_body(payload)?;

    let session_id = required_string(&body, "sessionId", SESSION_ID_REQUIRED)?;
    const SUMMARY_REQUIRED: &str = "Invalid payload: \"summary\" object is required.";
    if !body.get("summary").is_some_and(Value::is_object) {
        return Err(ServerError::bad_request(SUMMARY_REQUIRED));
    }
    let summary: VideoConceptSummary = required(&body, "summary", SUMMARY_REQUIRED)?;

    let saved = {
        let db = state.store()?;
        db.save_summary(&session_id, &summary)
    };

    match saved {
        Ok(canonical) => {
            info!(session = %session_id, "summary saved");
            Ok(Json(SaveResponse::saved("Summary saved successfully.", Some(canonical))))
        }
        Err(e) => {
            error!(session = %session_id, error = %e, "failed to save summary");
            Err(ServerError::Persistence {
                error: "Failed to save summary.",
                details: e.to_string(),
            })
        }
    }
}

pub(super) async fn process_conversation(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessedConversation>, ServerError> {
    let body = json_body(payload)?;
    let conversation: CompletedConversation = serde_json::from_value(body)
        .map_err(|e| ServerError::bad_request(format!("Invalid conversation payload: {e}")))?;

    let processed = extract(&conversation);

    let stored = {
        let db = state.store()?;
        db.save_processed(&processed)
    };
    if let Err(e) = stored {
        error!(id = %processed.id, error = %e, "failed to store processed conversation");
        return Err(ServerError::Processing(e.to_string()));
    }

    info!(
        id = %processed.id,
        kept = processed.processed_messages.len(),
        tags = ?processed.semantic_tags,
        "conversation processed"
    );
    Ok(Json(processed))
}
