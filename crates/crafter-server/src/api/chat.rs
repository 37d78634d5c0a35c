use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::{error, warn};

use crafter_shared::constants::SAFETY_REJECTION_MESSAGE;
use crafter_shared::protocol::ChatReply;
use crafter_shared::Message;

use super::{json_body, required, required_string, AppState};
use crate::error::ServerError;
use crate::gemini::{turns_from_history, GeminiError, Turn, CHAT_SETTINGS};

/// Sent in place of a history when the client asks for the opening question.
const OPENING_REQUEST: &str =
    "Based on your instructions, please provide your first question or statement to the user.";

const INVALID_KEY_MESSAGE: &str = "Invalid API Key. Please check server configuration.";
const GENERIC_FAILURE_MESSAGE: &str = "Failed to get response from LLM. Please try again later.";

fn failure(err: &GeminiError) -> ServerError {
    if err.is_safety() {
        ServerError::SafetyBlocked { message: SAFETY_REJECTION_MESSAGE, details: None }
    } else if err.is_invalid_key() {
        ServerError::Upstream { message: INVALID_KEY_MESSAGE.to_string(), details: None }
    } else {
        ServerError::Upstream { message: GENERIC_FAILURE_MESSAGE.to_string(), details: None }
    }
}

pub(super) async fn gemini_chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatReply>, ServerError> {
    let client = state.gemini()?;
    let body = json_body(payload)?;

    if !body.get("messages").is_some_and(Value::is_array) {
        return Err(ServerError::bad_request("Invalid payload: \"messages\" array is required."));
    }
    let messages: Vec<Message> = required(
        &body,
        "messages",
        "Invalid payload: \"messages\" array is required.",
    )?;
    let system_instruction = required_string(
        &body,
        "systemInstruction",
        "Invalid payload: \"systemInstruction\" string is required.",
    )?;

    let mut turns = turns_from_history(&messages);
    if turns.is_empty() {
        turns.push(Turn::user(OPENING_REQUEST));
    }

    match client
        .generate(Some(&system_instruction), &turns, &CHAT_SETTINGS)
        .await
    {
        Ok(reply) => Ok(Json(ChatReply { reply })),
        Err(e) => {
            if e.is_safety() {
                warn!(error = %e, "chat reply blocked by safety filter");
            } else {
                error!(error = %e, "chat generation failed");
            }
            Err(failure(&e))
        }
    }
}
