//! Scripted in-memory backend for tracker and editor tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crafter_shared::extract::{process_conversation, CompletedConversation, ProcessedConversation};
use crafter_shared::{ConceptData, Message, SessionId, VideoConceptSummary};

use crate::backend::{BackendError, ConversationBackend};

#[derive(Default)]
pub(crate) struct ScriptedBackend {
    pub replies: Mutex<VecDeque<Result<String, BackendError>>>,
    pub chat_requests: Mutex<Vec<Vec<Message>>>,
    pub saved_conversations: Mutex<Vec<(SessionId, Vec<Message>, ConceptData)>>,
    pub processed: Mutex<Vec<CompletedConversation>>,
    pub summarized: Mutex<Vec<Vec<Message>>>,
    pub saved_summaries: Mutex<Vec<VideoConceptSummary>>,
    pub summary: VideoConceptSummary,
    pub fail_saves: bool,
}

impl ScriptedBackend {
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::default();
        for reply in replies {
            backend.push_reply(Ok(reply.into()));
        }
        backend
    }

    pub fn push_reply(&self, reply: Result<String, BackendError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn save_count(&self) -> usize {
        self.saved_conversations.lock().unwrap().len()
    }
}

#[async_trait]
impl ConversationBackend for ScriptedBackend {
    async fn chat(
        &self,
        messages: &[Message],
        _system_instruction: &str,
    ) -> Result<String, BackendError> {
        self.chat_requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Server("script exhausted".into())))
    }

    async fn save_conversation(
        &self,
        session_id: &SessionId,
        messages: &[Message],
        concept_data: &ConceptData,
    ) -> Result<(), BackendError> {
        if self.fail_saves {
            return Err(BackendError::Server("Failed to save conversation.".into()));
        }
        self.saved_conversations.lock().unwrap().push((
            session_id.clone(),
            messages.to_vec(),
            concept_data.clone(),
        ));
        Ok(())
    }

    async fn process_conversation(
        &self,
        conversation: &CompletedConversation,
    ) -> Result<ProcessedConversation, BackendError> {
        self.processed.lock().unwrap().push(conversation.clone());
        Ok(process_conversation(conversation))
    }

    async fn summarize(&self, messages: &[Message]) -> Result<VideoConceptSummary, BackendError> {
        self.summarized.lock().unwrap().push(messages.to_vec());
        Ok(self.summary.clone())
    }

    async fn save_summary(
        &self,
        session_id: &SessionId,
        summary: &VideoConceptSummary,
    ) -> Result<VideoConceptSummary, BackendError> {
        if self.fail_saves {
            return Err(BackendError::Server("Failed to save summary.".into()));
        }
        let mut saved = self.saved_summaries.lock().unwrap();
        let now = Utc::now() + Duration::milliseconds(saved.len() as i64);

        let mut canonical = summary.clone();
        canonical.session_id = Some(session_id.to_string());
        canonical.saved_at = summary.saved_at.or(Some(now));
        canonical.last_updated_at = Some(now);
        saved.push(canonical.clone());
        Ok(canonical)
    }

    async fn summary_pdf(&self, _summary: &VideoConceptSummary) -> Result<Vec<u8>, BackendError> {
        Ok(b"%PDF-1.3".to_vec())
    }
}
