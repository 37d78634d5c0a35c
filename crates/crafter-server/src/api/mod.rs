//! HTTP gateways.
//!
//! Every endpoint except `/health` is `POST` with a JSON body. Bodies are
//! taken as raw [`Value`]s and validated field by field so each missing or
//! malformed field gets its own 400 message.

mod chat;
mod persistence;
mod summary;

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::Method,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crafter_shared::protocol::{
    PATH_CHAT, PATH_PROCESS_CONVERSATION, PATH_SAVE_CONVERSATION, PATH_SAVE_SUMMARY,
    PATH_SUMMARIZE, PATH_SUMMARY_PDF,
};
use crafter_store::Database;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::gemini::GeminiClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// `None` when the database could not be opened at startup.
    pub store: Option<Arc<Mutex<Database>>>,
    gemini: Arc<OnceLock<GeminiClient>>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Option<Database>) -> Self {
        Self {
            config: Arc::new(config),
            store: store.map(|db| Arc::new(Mutex::new(db))),
            gemini: Arc::new(OnceLock::new()),
        }
    }

    /// The shared generation client, created on first use.
    pub fn gemini(&self) -> Result<&GeminiClient, ServerError> {
        if let Some(client) = self.gemini.get() {
            return Ok(client);
        }
        let api_key = self
            .config
            .gemini_api_key
            .as_deref()
            .ok_or(ServerError::NotConfigured("API key not available."))?;

        Ok(self.gemini.get_or_init(|| {
            info!(model = %self.config.gemini_model, "initializing Gemini client");
            GeminiClient::new(
                api_key,
                self.config.gemini_model.clone(),
                self.config.gemini_api_base.clone(),
            )
        }))
    }

    /// Lock the document store. Never hold the guard across an `.await`.
    pub fn store(&self) -> Result<MutexGuard<'_, Database>, ServerError> {
        let store = self.store.as_ref().ok_or(ServerError::StoreUnavailable)?;
        store
            .lock()
            .map_err(|_| ServerError::Internal("document store lock poisoned".to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = if state.config.cors_allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route(PATH_CHAT, post(chat::gemini_chat))
        .route(PATH_SAVE_CONVERSATION, post(persistence::save_conversation))
        .route(PATH_PROCESS_CONVERSATION, post(persistence::process_conversation))
        .route(PATH_SUMMARIZE, post(summary::summarize_conversation))
        .route(PATH_SAVE_SUMMARY, post(persistence::save_summary))
        .route(PATH_SUMMARY_PDF, post(summary::generate_summary_pdf))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unwrap a JSON body, turning extractor rejections into a 400.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, ServerError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ServerError::bad_request(format!("Invalid JSON body: {}", rejection.body_text())))
}

/// Decode a required field, answering 400 with `message` if it is absent,
/// `null` or of the wrong shape.
fn required<T: DeserializeOwned>(body: &Value, name: &str, message: &str) -> Result<T, ServerError> {
    body.get(name)
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .ok_or_else(|| ServerError::bad_request(message))
}

/// Like [`required`] for strings, also rejecting empty ones.
fn required_string(body: &Value, name: &str, message: &str) -> Result<String, ServerError> {
    let value: String = required(body, name, message)?;
    if value.trim().is_empty() {
        return Err(ServerError::bad_request(message));
    }
    Ok(value)
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crafter_shared::Message;
    use crafter_store::Database;

    use super::summary::format_transcript;
    use super::*;
    use crate::config::ServerConfig;

    /// Stand up a one-route upstream that answers every request with `reply`.
    async fn fake_gemini(status: StatusCode, reply: Value) -> String {
        let app = Router::new().fallback(move || {
            let reply = reply.clone();
            async move { (status, axum::Json(reply)) }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn candidate(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn router(gemini_base: Option<String>, store: Option<Database>) -> Router {
        let mut config = ServerConfig::default();
        if let Some(base) = gemini_base {
            config.gemini_api_key = Some("test-key".into());
            config.gemini_api_base = base;
        }
        build_router(AppState::new(config, store))
    }

    /// Configured with a key but pointing nowhere; for validation paths.
    fn offline_router() -> Router {
        router(Some("http://127.0.0.1:9".into()), None)
    }

    fn store_router() -> Router {
        router(None, Some(Database::open_in_memory().unwrap()))
    }

    async fn send(app: Router, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(path);
        let body = match body {
            Some(value) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn post(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
        send(app, "POST", path, Some(body)).await
    }

    fn history() -> Value {
        serde_json::to_value(vec![
            Message::user("A video about urban trees"),
            Message::assistant("Great! What visual style do you envision?"),
            Message::user("Vibrant and hopeful"),
        ])
        .unwrap()
    }

    fn summary_json() -> Value {
        json!({
            "videoTitleSuggestion": "Roots of Tomorrow",
            "coreConcept": "Urban tree planting",
            "targetAudience": { "description": "City dwellers", "keyTakeaways": ["Trees cool streets"] },
            "keyMessages": ["Plant one tree"],
            "visualElements": { "style": "Vibrant", "moodTone": "Hopeful", "imagerySuggestions": [], "colorPalette": "Greens" },
            "contentStructureOutline": [{ "section": "Introduction", "description": "A seed" }],
            "additionalNotes": "Not specified"
        })
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let (status, body) = send(store_router(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_non_post_is_rejected() {
        let (status, _) = send(offline_router(), "GET", "/api/gemini-chat", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_chat_without_key_is_a_configuration_error() {
        let (status, body) = post(
            router(None, None),
            "/api/gemini-chat",
            json!({ "messages": [], "systemInstruction": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Server configuration error: API key not available.");
    }

    #[tokio::test]
    async fn test_chat_validates_payload() {
        let (status, body) = post(
            offline_router(),
            "/api/gemini-chat",
            json!({ "messages": "nope", "systemInstruction": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload: \"messages\" array is required.");

        let (status, body) = post(
            offline_router(),
            "/api/gemini-chat",
            json!({ "messages": [], "systemInstruction": 7 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload: \"systemInstruction\" string is required.");
    }

    #[tokio::test]
    async fn test_chat_returns_model_reply() {
        let base = fake_gemini(StatusCode::OK, candidate("What visual style do you envision?")).await;
        let (status, body) = post(
            router(Some(base), None),
            "/api/gemini-chat",
            json!({ "messages": history(), "systemInstruction": "ask questions" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "What visual style do you envision?");
    }

    #[tokio::test]
    async fn test_chat_maps_safety_block() {
        let base = fake_gemini(StatusCode::OK, json!({ "promptFeedback": { "blockReason": "SAFETY" } })).await;
        let (status, body) = post(
            router(Some(base), None),
            "/api/gemini-chat",
            json!({ "messages": history(), "systemInstruction": "ask questions" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"],
            "Response blocked due to safety settings. Please rephrase your input."
        );
    }

    #[tokio::test]
    async fn test_chat_maps_invalid_key() {
        let base = fake_gemini(
            StatusCode::BAD_REQUEST,
            json!({ "error": { "code": 400, "message": "API key not valid. Please pass a valid API key." } }),
        )
        .await;
        let (_, body) = post(
            router(Some(base), None),
            "/api/gemini-chat",
            json!({ "messages": [], "systemInstruction": "ask questions" }),
        )
        .await;
        assert_eq!(body["error"], "Invalid API Key. Please check server configuration.");
    }

    #[tokio::test]
    async fn test_save_conversation_requires_store() {
        let (status, body) = post(
            router(None, None),
            "/api/save-conversation",
            json!({ "sessionId": "abc", "messages": [], "conceptData": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_save_conversation_validates_and_saves() {
        let (status, body) = post(
            store_router(),
            "/api/save-conversation",
            json!({ "messages": [], "conceptData": {} }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload: \"sessionId\" string is required.");

        let (status, body) = post(
            store_router(),
            "/api/save-conversation",
            json!({ "sessionId": "abc", "messages": [], "conceptData": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload: \"conceptData\" object is required.");

        let (status, body) = post(
            store_router(),
            "/api/save-conversation",
            json!({
                "sessionId": "abc",
                "messages": history(),
                "conceptData": { "conceptDetails": "A video about urban trees" }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Conversation saved successfully.");
    }

    #[tokio::test]
    async fn test_saved_conversation_reaches_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crafter.db");
        let app = router(None, Some(Database::open_at(&path).unwrap()));

        let (status, _) = post(
            app,
            "/api/save-conversation",
            json!({
                "sessionId": "file0001",
                "messages": history(),
                "conceptData": { "conceptDetails": "A video about urban trees" }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let reopened = Database::open_at(&path).unwrap();
        let stored = reopened.get_conversation("file0001").unwrap();
        assert_eq!(stored.messages.len(), 3);
        assert_eq!(stored.messages[0].content, "A video about urban trees");
    }

    #[tokio::test]
    async fn test_save_summary_returns_canonical_copy() {
        let (status, body) = post(
            store_router(),
            "/api/save-summary",
            json!({ "sessionId": "abc", "summary": "text" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid payload: \"summary\" object is required.");

        let (status, body) = post(
            store_router(),
            "/api/save-summary",
            json!({ "sessionId": "abc", "summary": summary_json() }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["videoTitleSuggestion"], "Roots of Tomorrow");
        assert_eq!(body["data"]["sessionId"], "abc");
        assert!(body["data"]["savedAt"].is_string());
        assert!(body["data"]["lastUpdatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_process_conversation_extracts_and_stores() {
        let messages = serde_json::to_value(vec![
            Message::assistant("Who is the target audience for this video?"),
            Message::user("Young people in cities"),
            Message::user("ok"),
        ])
        .unwrap();

        let (status, body) = post(
            store_router(),
            "/api/conversation/process_conversation",
            json!({
                "id": "abc",
                "sessionId": "abc",
                "completedAt": { "_seconds": 1700000000, "_nanoseconds": 0 },
                "conceptData": { "conceptDetails": "Urban trees" },
                "messages": messages
            }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["extractedData"]["conceptDetails"], "Urban trees");
        assert_eq!(body["extractedData"]["targetAudience"][0], "Young people in cities");
        assert_eq!(body["processedMessages"].as_array().unwrap().len(), 2);
        assert_eq!(body["semanticTags"][0], "target_audience");
    }

    #[tokio::test]
    async fn test_summarize_rejects_empty_history() {
        let (status, body) = post(offline_router(), "/api/summarize-conversation", json!({ "messages": [] })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid or empty messages array provided.");
    }

    #[tokio::test]
    async fn test_summarize_parses_model_json() {
        let base = fake_gemini(StatusCode::OK, candidate(&summary_json().to_string())).await;
        let (status, body) = post(
            router(Some(base), None),
            "/api/summarize-conversation",
            json!({ "messages": history() }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videoTitleSuggestion"], "Roots of Tomorrow");
        assert_eq!(body["visualElements"]["style"], "Vibrant");
    }

    #[tokio::test]
    async fn test_summarize_rejects_malformed_model_output() {
        let base = fake_gemini(StatusCode::OK, candidate("Here is your summary!")).await;
        let (status, body) = post(
            router(Some(base), None),
            "/api/summarize-conversation",
            json!({ "messages": history() }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to generate video concept summary.");
        assert!(body["details"].is_string());
    }

    #[tokio::test]
    async fn test_pdf_requires_title() {
        let (status, body) = post(
            store_router(),
            "/api/generate-summary-pdf",
            json!({ "coreConcept": "No title here" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Invalid summary data provided. \"videoTitleSuggestion\" is missing."
        );
    }

    #[tokio::test]
    async fn test_pdf_is_an_attachment() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/generate-summary-pdf")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(summary_json().to_string()))
            .unwrap();
        let response = store_router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"roots_of_tomorrow.pdf\""
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_transcript_labels_speakers() {
        let transcript = format_transcript(&[Message::assistant("Hi"), Message::user("Hello")]);
        assert_eq!(transcript, "AI: Hi\nUser: Hello");
    }
}
