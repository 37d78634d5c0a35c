//! Review-and-edit state for a generated summary.
//!
//! The editor owns a working copy of a [`VideoConceptSummary`]. Edits are
//! typed: each one names the field it touches, so the working copy can never
//! drift out of the summary's fixed shape.

use thiserror::Error;
use tracing::{info, warn};

use crafter_shared::constants::MAX_DURATION_MINUTES;
use crafter_shared::summary::OutlineSection;
use crafter_shared::timestamp::format_display;
use crafter_shared::{SessionId, VideoConceptSummary};

use crate::backend::{BackendError, ConversationBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    VideoTitle,
    CoreConcept,
    AudienceDescription,
    VisualStyle,
    MoodTone,
    ColorPalette,
    Resolution,
    AspectRatio,
    TargetDuration,
    AdditionalNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    KeyMessages,
    AudienceTakeaways,
    ImagerySuggestions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlinePart {
    Section,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryEdit {
    SetText { field: TextField, value: String },
    SetListItem { list: ListField, index: usize, value: String },
    AddListItem { list: ListField },
    RemoveListItem { list: ListField, index: usize },
    SetOutlineItem { index: usize, part: OutlinePart, value: String },
    AddOutlineItem,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("Index {index} is out of range for a list of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum SaveError {
    /// Validation failed; nothing was sent.
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Parse a target duration in minutes.
pub fn validate_duration(value: &str) -> Result<f64, &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err("Target duration is required.");
    }
    let minutes: f64 = match value.parse() {
        Ok(m) if f64::is_finite(m) => m,
        _ => return Err("Invalid format. Please enter a number for minutes (e.g., 0.5 or 1)."),
    };
    if minutes <= 0.0 {
        return Err("Duration must be greater than 0 minutes.");
    }
    if minutes > MAX_DURATION_MINUTES {
        return Err("Duration cannot exceed 1 minute.");
    }
    Ok(minutes)
}

fn checked(index: usize, len: usize) -> Result<usize, EditError> {
    if index < len {
        Ok(index)
    } else {
        Err(EditError::IndexOutOfRange { index, len })
    }
}

pub struct SummaryEditor {
    session_id: SessionId,
    working: VideoConceptSummary,
    duration_error: Option<&'static str>,
    approved: bool,
    last_error: Option<String>,
}

impl SummaryEditor {
    pub fn new(session_id: SessionId, summary: VideoConceptSummary) -> Self {
        let duration_error =
            validate_duration(&summary.technical_specifications.target_duration).err();
        Self {
            session_id,
            working: summary,
            duration_error,
            approved: false,
            last_error: None,
        }
    }

    pub fn summary(&self) -> &VideoConceptSummary {
        &self.working
    }

    pub fn duration_error(&self) -> Option<&'static str> {
        self.duration_error
    }

    pub fn is_approved(&self) -> bool {
        self.approved
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn text_mut(&mut self, field: TextField) -> &mut String {
        let s = &mut self.working;
        match field {
            TextField::VideoTitle => &mut s.video_title_suggestion,
            TextField::CoreConcept => &mut s.core_concept,
            TextField::AudienceDescription => &mut s.target_audience.description,
            TextField::VisualStyle => &mut s.visual_elements.style,
            TextField::MoodTone => &mut s.visual_elements.mood_tone,
            TextField::ColorPalette => &mut s.visual_elements.color_palette,
            TextField::Resolution => &mut s.technical_specifications.resolution,
            TextField::AspectRatio => &mut s.technical_specifications.aspect_ratio,
            TextField::TargetDuration => &mut s.technical_specifications.target_duration,
            TextField::AdditionalNotes => &mut s.additional_notes,
        }
    }

    fn list_mut(&mut self, list: ListField) -> &mut Vec<String> {
        let s = &mut self.working;
        match list {
            ListField::KeyMessages => &mut s.key_messages,
            ListField::AudienceTakeaways => &mut s.target_audience.key_takeaways,
            ListField::ImagerySuggestions => &mut s.visual_elements.imagery_suggestions,
        }
    }

    /// Apply one edit. A rejected edit leaves the working copy untouched.
    pub fn apply(&mut self, edit: SummaryEdit) -> Result<(), EditError> {
        match edit {
            SummaryEdit::SetText { field, value } => {
                *self.text_mut(field) = value;
                if field == TextField::TargetDuration {
                    self.duration_error =
                        validate_duration(&self.working.technical_specifications.target_duration)
                            .err();
                }
            }
            SummaryEdit::SetListItem { list, index, value } => {
                let items = self.list_mut(list);
                let index = checked(index, items.len())?;
                items[index] = value;
            }
            SummaryEdit::AddListItem { list } => self.list_mut(list).push(String::new()),
            SummaryEdit::RemoveListItem { list, index } => {
                let items = self.list_mut(list);
                let index = checked(index, items.len())?;
                items.remove(index);
            }
            SummaryEdit::SetOutlineItem { index, part, value } => {
                let outline = &mut self.working.content_structure_outline;
                let index = checked(index, outline.len())?;
                match part {
                    OutlinePart::Section => outline[index].section = value,
                    OutlinePart::Description => outline[index].description = value,
                }
            }
            SummaryEdit::AddOutlineItem => {
                self.working.content_structure_outline.push(OutlineSection::default())
            }
        }
        self.approved = false;
        Ok(())
    }

    /// Validate and persist the working copy.
    ///
    /// On success the working copy becomes the server's canonical copy and is
    /// marked approved. On failure it is kept as is and the error recorded.
    pub async fn save<B: ConversationBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Result<&VideoConceptSummary, SaveError> {
        if let Some(message) = self.duration_error {
            self.last_error = Some(message.to_string());
            return Err(SaveError::Invalid(message.to_string()));
        }

        let result = backend.save_summary(&self.session_id, &self.working).await;
        match result {
            Ok(canonical) => {
                info!(session = %self.session_id, "summary approved");
                self.working = canonical;
                self.approved = true;
                self.last_error = None;
                Ok(&self.working)
            }
            Err(e) => {
                warn!(session = %self.session_id, error = %e, "failed to save summary");
                self.approved = false;
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn status_line(&self) -> String {
        format!(
            "Last modified: {}",
            format_display(self.working.last_updated_at.as_ref())
        )
    }
}
