//! Minimal client for the Gemini `generateContent` REST endpoint.
//!
//! Only what the two generation gateways need: a system instruction, a list
//! of alternating turns, fixed safety settings and plain-text extraction of
//! the first candidate.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crafter_shared::{Message, Role};

const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

const BLOCK_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    /// Ask for `application/json` output.
    pub json_output: bool,
}

pub const CHAT_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.7,
    max_output_tokens: Some(2048),
    json_output: false,
};

pub const SUMMARY_SETTINGS: GenerationSettings = GenerationSettings {
    temperature: 0.3,
    max_output_tokens: None,
    json_output: true,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnRole {
    User,
    Model,
}

impl TurnRole {
    fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Model => "model",
        }
    }
}

/// One entry of the `contents` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, text: text.into() }
    }
}

/// Map a chat history onto Gemini turns (assistant → `model`).
pub fn turns_from_history(messages: &[Message]) -> Vec<Turn> {
    messages
        .iter()
        .map(|m| match m.role {
            Role::User => Turn::user(m.content.clone()),
            Role::Assistant => Turn::model(m.content.clone()),
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response blocked due to safety settings ({0})")]
    Blocked(String),

    #[error("Gemini returned no text")]
    EmptyResponse,

    #[error("Failed to parse Gemini response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GeminiError {
    /// Blocked content, or any upstream message mentioning safety.
    pub fn is_safety(&self) -> bool {
        matches!(self, GeminiError::Blocked(_)) || self.to_string().to_lowercase().contains("safety")
    }

    pub fn is_invalid_key(&self) -> bool {
        self.to_string().to_lowercase().contains("api key not valid")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn build_request_body(
        system: Option<&str>,
        turns: &[Turn],
        settings: &GenerationSettings,
    ) -> Value {
        let contents: Vec<Value> = turns
            .iter()
            .map(|t| {
                json!({
                    "role": t.role.as_str(),
                    "parts": [{ "text": t.text }],
                })
            })
            .collect();

        let safety_settings: Vec<Value> = HARM_CATEGORIES
            .iter()
            .map(|c| json!({ "category": c, "threshold": BLOCK_THRESHOLD }))
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": { "temperature": settings.temperature },
            "safetySettings": safety_settings,
        });

        if let Some(max) = settings.max_output_tokens {
            body["generationConfig"]["maxOutputTokens"] = json!(max);
        }
        if settings.json_output {
            body["generationConfig"]["responseMimeType"] = json!("application/json");
        }
        if let Some(sys) = system {
            body["systemInstruction"] = json!({ "parts": [{ "text": sys }] });
        }

        body
    }

    /// Run one generation and return the concatenated text of the first candidate.
    pub async fn generate(
        &self,
        system: Option<&str>,
        turns: &[Turn],
        settings: &GenerationSettings,
    ) -> Result<String, GeminiError> {
        let body = Self::build_request_body(system, turns, settings);
        debug!(model = %self.model, turns = turns.len(), "calling generateContent");

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;

        if status != 200 {
            return Err(parse_api_error(status, &text));
        }

        extract_text(serde_json::from_str(&text)?)
    }
}

fn parse_api_error(status: u16, body: &str) -> GeminiError {
    let message = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    GeminiError::Api { status, message }
}

fn extract_text(response: GenerateResponse) -> Result<String, GeminiError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GeminiError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(GeminiError::EmptyResponse)?;

    if candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(GeminiError::Blocked("SAFETY".to_string()));
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        Err(GeminiError::EmptyResponse)
    } else {
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(fixture: Value) -> Result<String, GeminiError> {
        extract_text(serde_json::from_value(fixture).unwrap())
    }

    #[test]
    fn test_turn_roles() {
        let history = vec![Message::user("hello"), Message::assistant("hi")];
        let turns = turns_from_history(&history);
        assert_eq!(turns, vec![Turn::user("hello"), Turn::model("hi")]);
    }

    #[test]
    fn test_chat_request_body() {
        let body = GeminiClient::build_request_body(
            Some("be brief"),
            &[Turn::user("hello")],
            &CHAT_SETTINGS,
        );

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("responseMimeType").is_none());
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], BLOCK_THRESHOLD);
    }

    #[test]
    fn test_summary_request_body() {
        let body = GeminiClient::build_request_body(None, &[Turn::user("x")], &SUMMARY_SETTINGS);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body.get("systemInstruction").is_none());
        assert!(body["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_extracts_joined_parts() {
        let text = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Great. " }, { "text": "Next?" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(text, "Great. Next?");
    }

    #[test]
    fn test_blocked_prompt_is_safety() {
        let err = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap_err();
        assert!(err.is_safety());

        let err = parse(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap_err();
        assert!(matches!(err, GeminiError::Blocked(_)));
    }

    #[test]
    fn test_empty_candidates() {
        let err = parse(json!({ "candidates": [] })).unwrap_err();
        assert!(matches!(err, GeminiError::EmptyResponse));
        assert!(!err.is_safety());
    }

    #[test]
    fn test_api_error_message() {
        let err = parse_api_error(
            400,
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#,
        );
        assert!(err.is_invalid_key());
        assert!(!err.is_safety());

        let err = parse_api_error(502, "bad gateway");
        assert!(err.to_string().contains("bad gateway"));
    }
}
