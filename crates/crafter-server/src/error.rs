use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Payload failed validation; the message is returned verbatim.
    #[error("{0}")]
    BadRequest(String),

    #[error("Server configuration error: {0}")]
    NotConfigured(&'static str),

    /// The document store could not be opened at startup.
    #[error("Server configuration error: document store not initialized.")]
    StoreUnavailable,

    /// A generation call failed; `message` is client-facing.
    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    /// The model or its safety filter refused the content.
    #[error("{message}")]
    SafetyBlocked {
        message: &'static str,
        details: Option<String>,
    },

    /// The model answered, but not with a usable summary document.
    #[error("Failed to generate video concept summary.")]
    MalformedUpstream(String),

    /// A persistence endpoint failed; answered in the save-response shape.
    #[error("{error}")]
    Persistence { error: &'static str, details: String },

    #[error("Error processing conversation")]
    Processing(String),

    #[error("Failed to generate PDF summary.")]
    Pdf(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ServerError::BadRequest(message.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message, details, save_shape) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string(), None, false),
            ServerError::NotConfigured(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None, false)
            }
            ServerError::StoreUnavailable => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None, true)
            }
            ServerError::Upstream { details, .. } | ServerError::SafetyBlocked { details, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                details.clone(),
                false,
            ),
            ServerError::MalformedUpstream(details)
            | ServerError::Processing(details)
            | ServerError::Pdf(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                Some(details.clone()),
                false,
            ),
            ServerError::Persistence { details, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                self.to_string(),
                Some(details.clone()),
                true,
            ),
            ServerError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
                false,
            ),
        };

        let mut body = serde_json::json!({
            "error": message,
        });
        if let Some(details) = details {
            body["details"] = serde_json::Value::String(details);
        }
        if save_shape {
            body["success"] = serde_json::Value::Bool(false);
        }

        (status, axum::Json(body)).into_response()
    }
}
