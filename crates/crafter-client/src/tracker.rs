//! Conversation state tracker.
//!
//! Owns one live session: the display history (what the user sees, starting
//! with the synthetic greeting), the gateway history (what the model sees,
//! never containing the greeting) and the accumulated concept record. Each
//! submission is one round trip through the chat gateway; when the model
//! signals completion the session is persisted and handed to the extractor.

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crafter_shared::catalog::opening_prompt;
use crafter_shared::constants::{COMPLETION_MARKER, GREETING, SAFETY_REJECTION_PATTERN};
use crafter_shared::extract::CompletedConversation;
use crafter_shared::{
    Category, ConceptData, Message, Role, SessionId, VideoConceptSummary, CATALOG,
};

use crate::attribution::{PromptEchoMatcher, TopicAttribution};
use crate::backend::{BackendError, ConversationBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    AwaitingFirstInput,
    InDialog,
    Completed,
    /// Entered after a safety rejection; only a reset leaves it.
    SafetyBlocked,
}

/// What a successful `submit` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Replied,
    Completed,
    /// The gateway failed; an apology was appended and the dialog continues.
    Failed(String),
    SafetyBlocked,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("The conversation is complete. Start over to begin a new one.")]
    Completed,

    #[error("The conversation is blocked after a safety rejection. Start over to continue.")]
    SafetyBlocked,

    #[error("Conversation is still being processed. Please wait a moment.")]
    ProcessingIncomplete,

    #[error("Cannot generate summary for an initial greeting message only.")]
    GreetingOnly,

    #[error("{0}")]
    Backend(#[from] BackendError),
}

/// Remove every completion marker; the reply is trimmed only when one was found.
pub fn strip_completion_marker(reply: &str) -> (String, bool) {
    if reply.contains(COMPLETION_MARKER) {
        (reply.replace(COMPLETION_MARKER, "").trim().to_string(), true)
    } else {
        (reply.to_string(), false)
    }
}

pub fn is_safety_rejection(message: &str) -> bool {
    message.to_lowercase().contains(SAFETY_REJECTION_PATTERN)
}

fn apology(message: &str) -> String {
    format!("Sorry, I encountered an error: {message}. Please try again.")
}

/// Instruction sent with every chat call, built from the catalog.
pub fn system_instruction() -> String {
    let first = &CATALOG[0];
    let second = &CATALOG[1];
    let remaining: Vec<&str> = CATALOG[1..].iter().map(|t| t.category.key()).collect();
    let all: Vec<&str> = CATALOG.iter().map(|t| t.category.key()).collect();

    format!(
        "You are ConceptCrafterAI, a friendly and highly efficient assistant. Your goal is to help the user develop a video concept by asking a series of questions.\n\
         Your first turn, which is not included in the chat history you receive, greeted the user and asked: \"{opening}\".\n\
         The user's first message in the history is their reply to that opening question about the topic '{first_key}'.\n\
         If an answer is very short, incomplete or unclear, ask one specific follow-up question about the same topic before moving on. Do not ask more than one or two follow-ups per topic.\n\
         Once '{first_key}' is covered, move on to '{second_key}' by asking: \"{second_prompt}\".\n\
         Then guide the user through the remaining topics one by one: {remaining}, asking each topic's main question.\n\
         When all topics ({all}) are reasonably covered, or the user has nothing more to add, give a short, polite closing message and then, on a new line, the marker: {marker}\n\
         Do not use markdown formatting. Keep responses concise and focused.",
        opening = opening_prompt(),
        first_key = first.category.key(),
        second_key = second.category.key(),
        second_prompt = second.prompt,
        remaining = remaining.join(", "),
        all = all.join(", "),
        marker = COMPLETION_MARKER,
    )
}

pub struct ConversationTracker<B> {
    backend: B,
    attribution: Box<dyn TopicAttribution>,
    system_instruction: String,
    session_id: SessionId,
    state: DialogState,
    messages: Vec<Message>,
    gateway_history: Vec<Message>,
    concept_data: ConceptData,
    is_typing: bool,
    current_topic_index: usize,
    processed_messages: Option<Vec<Message>>,
    is_processing_complete: bool,
    summary: Option<VideoConceptSummary>,
}

impl<B: ConversationBackend> ConversationTracker<B> {
    pub fn new(backend: B) -> Self {
        Self::with_attribution(backend, Box::new(PromptEchoMatcher))
    }

    pub fn with_attribution(backend: B, attribution: Box<dyn TopicAttribution>) -> Self {
        let mut tracker = Self {
            backend,
            attribution,
            system_instruction: system_instruction(),
            session_id: SessionId::new(),
            state: DialogState::AwaitingFirstInput,
            messages: Vec::new(),
            gateway_history: Vec::new(),
            concept_data: ConceptData::new(),
            is_typing: false,
            current_topic_index: 0,
            processed_messages: None,
            is_processing_complete: false,
            summary: None,
        };
        tracker.reset();
        tracker
    }

    /// Start a fresh session: new id, empty record, greeting re-seeded.
    pub fn reset(&mut self) {
        self.session_id = SessionId::new();
        self.state = DialogState::AwaitingFirstInput;
        self.messages = vec![Message::assistant(opening_prompt())];
        self.gateway_history.clear();
        self.concept_data.clear();
        self.is_typing = false;
        self.current_topic_index = 0;
        self.processed_messages = None;
        self.is_processing_complete = false;
        self.summary = None;
        debug!(session = %self.session_id, "conversation reset");
    }

    /// Send one user answer and record the reply.
    pub async fn submit(&mut self, input: &str) -> Result<SubmitOutcome, TrackerError> {
        if input.trim().is_empty() {
            return Err(TrackerError::EmptyInput);
        }
        match self.state {
            DialogState::Completed => return Err(TrackerError::Completed),
            DialogState::SafetyBlocked => return Err(TrackerError::SafetyBlocked),
            DialogState::AwaitingFirstInput => self.state = DialogState::InDialog,
            DialogState::InDialog => {}
        }

        let user = Message::user(input);
        self.messages.push(user.clone());
        self.gateway_history.push(user);

        self.is_typing = true;
        let result = self
            .backend
            .chat(&self.gateway_history, &self.system_instruction)
            .await;
        self.is_typing = false;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => return Ok(self.record_failure(e)),
        };

        if let Some(category) = self.attribution.attribute(&self.gateway_history) {
            self.concept_data.append(category, input);
            self.current_topic_index = category.index();
            debug!(session = %self.session_id, %category, "answer attributed");
        }

        let (text, complete) = strip_completion_marker(&reply);
        let assistant = Message::assistant(text);
        self.messages.push(assistant.clone());
        self.gateway_history.push(assistant);

        if complete {
            self.state = DialogState::Completed;
            info!(
                session = %self.session_id,
                topics = self.concept_data.len(),
                "conversation complete"
            );
            self.persist().await;
            return Ok(SubmitOutcome::Completed);
        }

        Ok(SubmitOutcome::Replied)
    }

    fn record_failure(&mut self, error: BackendError) -> SubmitOutcome {
        let message = error.to_string();
        let apology = Message::assistant(apology(&message));
        self.messages.push(apology.clone());
        self.gateway_history.push(apology);

        if is_safety_rejection(&message) {
            warn!(session = %self.session_id, "reply blocked by safety settings");
            self.state = DialogState::SafetyBlocked;
            SubmitOutcome::SafetyBlocked
        } else {
            warn!(session = %self.session_id, error = %message, "chat request failed");
            SubmitOutcome::Failed(message)
        }
    }

    /// Save the finished conversation, then run the extractor over it.
    /// Failures are logged; the session stays complete either way.
    async fn persist(&mut self) {
        if let Err(e) = self
            .backend
            .save_conversation(&self.session_id, &self.messages, &self.concept_data)
            .await
        {
            warn!(session = %self.session_id, error = %e, "failed to save conversation");
            return;
        }

        let conversation = CompletedConversation {
            id: self.session_id.to_string(),
            session_id: self.session_id.to_string(),
            completed_at: Some(Utc::now()),
            concept_data: self.concept_data.clone(),
            messages: self.messages.clone(),
        };

        match self.backend.process_conversation(&conversation).await {
            Ok(processed) => {
                debug!(
                    session = %self.session_id,
                    kept = processed.processed_messages.len(),
                    "conversation processed"
                );
                self.processed_messages = Some(processed.processed_messages);
                self.is_processing_complete = true;
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to process conversation");
            }
        }
    }

    /// Summarize the finished conversation and save the result.
    ///
    /// Uses the extractor's filtered messages when available. A failed save
    /// still returns the generated summary.
    pub async fn generate_summary(&mut self) -> Result<VideoConceptSummary, TrackerError> {
        if !self.is_processing_complete {
            return Err(TrackerError::ProcessingIncomplete);
        }

        let source = self.processed_messages.as_deref().unwrap_or(&self.messages);
        let greeting_only = source
            .iter()
            .all(|m| m.role == Role::Assistant && m.content.contains(GREETING));
        if source.is_empty() || greeting_only {
            return Err(TrackerError::GreetingOnly);
        }

        let summary = self.backend.summarize(source).await?;

        let summary = match self.backend.save_summary(&self.session_id, &summary).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to save generated summary");
                summary
            }
        };

        self.summary = Some(summary.clone());
        Ok(summary)
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Display history, greeting first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn gateway_history(&self) -> &[Message] {
        &self.gateway_history
    }

    pub fn concept_data(&self) -> &ConceptData {
        &self.concept_data
    }

    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    pub fn is_complete(&self) -> bool {
        self.state == DialogState::Completed
    }

    pub fn is_safety_blocked(&self) -> bool {
        self.state == DialogState::SafetyBlocked
    }

    pub fn is_processing_complete(&self) -> bool {
        self.is_processing_complete
    }

    pub fn current_topic_index(&self) -> usize {
        self.current_topic_index
    }

    pub fn current_topic(&self) -> Category {
        CATALOG[self.current_topic_index].category
    }

    pub fn summary(&self) -> Option<&VideoConceptSummary> {
        self.summary.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
