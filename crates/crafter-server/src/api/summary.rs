use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crafter_shared::{Message, Role, VideoConceptSummary};

use super::{json_body, AppState};
use crate::error::ServerError;
use crate::gemini::{Turn, SUMMARY_SETTINGS};
use crate::pdf;

const SUMMARY_FAILURE: &str = "Failed to generate video concept summary.";
const SUMMARY_BLOCKED: &str = "Content blocked due to safety settings.";

const SUMMARY_INSTRUCTIONS: &str = r#"You are an expert video concept developer and script assistant.
Analyze the conversation below between an AI assistant and a user, where they discussed ideas for a new video.
From it, produce a concise, hierarchical summary that will be used to create a video storyboard and production plan.

--- BEGIN CONVERSATION ---
{transcript}
--- END CONVERSATION ---

Return the information as JSON in exactly this shape.
If a field cannot be determined from the conversation, use "Not specified" or an empty array [] as appropriate.

{
  "videoTitleSuggestion": "A concise and catchy title suggestion based on the concept.",
  "coreConcept": "A brief (1-2 sentence) summary of the main idea or purpose of the video.",
  "targetAudience": {
    "description": "Who is the video for?",
    "keyTakeaways": ["What should this audience learn or feel?"]
  },
  "keyMessages": ["The primary messages the video should convey."],
  "visualElements": {
    "style": "The overall visual style (e.g., vibrant, minimalist, corporate, artistic).",
    "moodTone": "The desired mood or tone (e.g., hopeful, urgent, informative).",
    "imagerySuggestions": ["Specific imagery, scenes or visual metaphors suggested by the conversation."],
    "colorPalette": "A color palette if mentioned or implied."
  },
  "contentStructureOutline": [
    { "section": "Introduction", "description": "How the video might start and hook the audience." },
    { "section": "Problem_Context", "description": "The core issue being addressed." },
    { "section": "KeyMessage1", "description": "Detail related to the first key message." },
    { "section": "KeyMessage2", "description": "Detail related to the second key message." },
    { "section": "CallToAction_Conclusion", "description": "What the audience should do or think next; how the video concludes." }
  ],
  "additionalNotes": "Any other relevant details, constraints, or creative ideas mentioned."
}"#;

/// One `AI: ...` or `User: ...` line per message.
pub(crate) fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::Assistant => "AI",
                Role::User => "User",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn summary_prompt(transcript: &str) -> String {
    SUMMARY_INSTRUCTIONS.replace("{transcript}", transcript)
}

pub(super) async fn summarize_conversation(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<VideoConceptSummary>, ServerError> {
    let client = state.gemini()?;
    let body = json_body(payload)?;

    let messages: Vec<Message> = body
        .get("messages")
        .filter(|v| v.as_array().is_some_and(|a| !a.is_empty()))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .ok_or_else(|| ServerError::bad_request("Invalid or empty messages array provided."))?;

    let prompt = summary_prompt(&format_transcript(&messages));

    let text = client
        .generate(None, &[Turn::user(prompt)], &SUMMARY_SETTINGS)
        .await
        .map_err(|e| {
            error!(error = %e, "summary generation failed");
            if e.is_safety() {
                ServerError::SafetyBlocked { message: SUMMARY_BLOCKED, details: Some(e.to_string()) }
            } else {
                ServerError::Upstream { message: SUMMARY_FAILURE.to_string(), details: Some(e.to_string()) }
            }
        })?;

    let summary: VideoConceptSummary = serde_json::from_str(text.trim()).map_err(|e| {
        warn!(error = %e, "model returned a malformed summary");
        ServerError::MalformedUpstream(e.to_string())
    })?;

    info!(messages = messages.len(), title = %summary.video_title_suggestion, "summary generated");
    Ok(Json(summary))
}

pub(super) async fn generate_summary_pdf(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServerError> {
    const TITLE_MISSING: &str =
        "Invalid summary data provided. \"videoTitleSuggestion\" is missing.";

    let body = json_body(payload)?;
    if !body.is_object() {
        return Err(ServerError::bad_request(TITLE_MISSING));
    }
    let summary: VideoConceptSummary = serde_json::from_value(body)
        .map_err(|e| ServerError::bad_request(format!("Invalid summary data provided: {e}")))?;
    if !summary.has_title() {
        return Err(ServerError::bad_request(TITLE_MISSING));
    }

    let filename = summary.file_stem();
    let bytes = tokio::task::spawn_blocking(move || pdf::render(&summary))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(|e| {
            error!(error = %e, "PDF rendering failed");
            ServerError::Pdf(e.to_string())
        })?;

    info!(file = %filename, size = bytes.len(), "summary PDF generated");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
