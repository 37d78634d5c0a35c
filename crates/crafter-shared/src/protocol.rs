//! JSON payloads exchanged between the chat client and the HTTP gateways.

use serde::{Deserialize, Serialize};

use crate::summary::VideoConceptSummary;
use crate::types::{ConceptData, Message, SessionId};

pub const PATH_CHAT: &str = "/api/gemini-chat";
pub const PATH_SAVE_CONVERSATION: &str = "/api/save-conversation";
pub const PATH_PROCESS_CONVERSATION: &str = "/api/conversation/process_conversation";
pub const PATH_SUMMARIZE: &str = "/api/summarize-conversation";
pub const PATH_SAVE_SUMMARY: &str = "/api/save-summary";
pub const PATH_SUMMARY_PDF: &str = "/api/generate-summary-pdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub system_instruction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveConversationRequest {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub concept_data: ConceptData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizeRequest {
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSummaryRequest {
    pub session_id: SessionId,
    pub summary: VideoConceptSummary,
}

/// Result body of the persistence endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl<T> SaveResponse<T> {
    pub fn saved(message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            error: None,
            details: None,
        }
    }
}

/// Error body returned by every endpoint on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
