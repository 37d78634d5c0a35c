//! The gateways the client calls, behind one trait so the tracker and editor
//! can be driven by an in-memory backend in tests.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crafter_shared::extract::{CompletedConversation, ProcessedConversation};
use crafter_shared::protocol::{
    ChatReply, ChatRequest, ErrorBody, SaveConversationRequest, SaveResponse, SaveSummaryRequest,
    SummarizeRequest, PATH_CHAT, PATH_PROCESS_CONVERSATION, PATH_SAVE_CONVERSATION,
    PATH_SAVE_SUMMARY, PATH_SUMMARIZE, PATH_SUMMARY_PDF,
};
use crafter_shared::{ConceptData, Message, SessionId, VideoConceptSummary};

#[derive(Debug, Error)]
pub enum BackendError {
    /// Error text reported by the server.
    #[error("{0}")]
    Server(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Text-generation gateway: the next assistant reply for `messages`.
    async fn chat(&self, messages: &[Message], system_instruction: &str)
        -> Result<String, BackendError>;

    async fn save_conversation(
        &self,
        session_id: &SessionId,
        messages: &[Message],
        concept_data: &ConceptData,
    ) -> Result<(), BackendError>;

    async fn process_conversation(
        &self,
        conversation: &CompletedConversation,
    ) -> Result<ProcessedConversation, BackendError>;

    async fn summarize(&self, messages: &[Message]) -> Result<VideoConceptSummary, BackendError>;

    /// Persist a summary and return the server's canonical copy.
    async fn save_summary(
        &self,
        session_id: &SessionId,
        summary: &VideoConceptSummary,
    ) -> Result<VideoConceptSummary, BackendError>;

    async fn summary_pdf(&self, summary: &VideoConceptSummary) -> Result<Vec<u8>, BackendError>;
}

/// [`ConversationBackend`] over the ConceptCrafter HTTP API.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "POST");

        let response = self.http.post(&url).json(body).send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("API call failed: {status}"),
        };
        Err(BackendError::Server(message))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        Ok(self.post(path, body).await?.json::<T>().await?)
    }
}

fn into_result<T>(response: SaveResponse<T>) -> Result<Option<T>, BackendError> {
    if response.success {
        Ok(response.data)
    } else {
        Err(BackendError::Server(
            response.error.unwrap_or_else(|| "Unknown server error".to_string()),
        ))
    }
}

#[async_trait]
impl ConversationBackend for HttpBackend {
    async fn chat(
        &self,
        messages: &[Message],
        system_instruction: &str,
    ) -> Result<String, BackendError> {
        let request = ChatRequest {
            messages: messages.to_vec(),
            system_instruction: system_instruction.to_string(),
        };
        let reply: ChatReply = self.post_json(PATH_CHAT, &request).await?;
        Ok(reply.reply)
    }

    async fn save_conversation(
        &self,
        session_id: &SessionId,
        messages: &[Message],
        concept_data: &ConceptData,
    ) -> Result<(), BackendError> {
        let request = SaveConversationRequest {
            session_id: session_id.clone(),
            messages: messages.to_vec(),
            concept_data: concept_data.clone(),
        };
        let response: SaveResponse<serde_json::Value> =
            self.post_json(PATH_SAVE_CONVERSATION, &request).await?;
        into_result(response).map(|_| ())
    }

    async fn process_conversation(
        &self,
        conversation: &CompletedConversation,
    ) -> Result<ProcessedConversation, BackendError> {
        self.post_json(PATH_PROCESS_CONVERSATION, conversation).await
    }

    async fn summarize(&self, messages: &[Message]) -> Result<VideoConceptSummary, BackendError> {
        let request = SummarizeRequest { messages: messages.to_vec() };
        self.post_json(PATH_SUMMARIZE, &request).await
    }

    async fn save_summary(
        &self,
        session_id: &SessionId,
        summary: &VideoConceptSummary,
    ) -> Result<VideoConceptSummary, BackendError> {
        let request = SaveSummaryRequest {
            session_id: session_id.clone(),
            summary: summary.clone(),
        };
        let response: SaveResponse<VideoConceptSummary> =
            self.post_json(PATH_SAVE_SUMMARY, &request).await?;
        Ok(into_result(response)?.unwrap_or_else(|| summary.clone()))
    }

    async fn summary_pdf(&self, summary: &VideoConceptSummary) -> Result<Vec<u8>, BackendError> {
        let response = self.post(PATH_SUMMARY_PDF, summary).await?;
        Ok(response.bytes().await?.to_vec())
    }
}
