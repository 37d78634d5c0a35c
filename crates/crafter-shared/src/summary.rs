//! The structured video concept summary produced from a finished transcript.
//!
//! Every field tolerates being missing or `null` on the wire; the model is
//! asked to fill undeterminable fields with `"Not specified"` or `[]`, but it
//! does not always comply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::constants::NOT_SPECIFIED;
use crate::timestamp;

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoConceptSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_title_suggestion: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub core_concept: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_audience: TargetAudience,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_messages: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visual_elements: VisualElements,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content_structure_outline: Vec<OutlineSection>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical_specifications: TechnicalSpecifications,
    #[serde(default, deserialize_with = "null_as_default")]
    pub additional_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// First-write time, assigned by the store.
    #[serde(default, with = "timestamp::flexible_option", skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// Last-write time, assigned by the store on every save.
    #[serde(default, with = "timestamp::flexible_option", skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_takeaways: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VisualElements {
    #[serde(default, deserialize_with = "null_as_default")]
    pub style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mood_tone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub imagery_suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color_palette: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutlineSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub section: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSpecifications {
    #[serde(default, deserialize_with = "null_as_default")]
    pub resolution: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aspect_ratio: String,
    /// Target duration in minutes, kept as entered.
    #[serde(default, deserialize_with = "null_as_default")]
    pub target_duration: String,
}

impl VideoConceptSummary {
    pub fn has_title(&self) -> bool {
        !self.video_title_suggestion.trim().is_empty()
    }

    /// Additional notes worth exporting: non-blank and not the placeholder.
    pub fn meaningful_notes(&self) -> Option<&str> {
        let notes = self.additional_notes.trim();
        if notes.is_empty() || notes.eq_ignore_ascii_case(NOT_SPECIFIED) {
            None
        } else {
            Some(notes)
        }
    }

    /// File name stem for the exported document: the lower-cased title with
    /// anything outside `[a-z0-9_.-]` replaced by `_`.
    pub fn file_stem(&self) -> String {
        let title = if self.has_title() {
            self.video_title_suggestion.as_str()
        } else {
            "concept_summary"
        };
        title
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_file_stem() {
        let stem = |title: &str| VideoConceptSummary {
            video_title_suggestion: title.into(),
            ..Default::default()
        }
        .file_stem();

        assert_eq!(stem("Roots of Tomorrow!"), "roots_of_tomorrow_");
        assert_eq!(stem("v1.2-Final_Cut"), "v1.2-final_cut");
        assert_eq!(stem("Café"), "caf_");
        assert_eq!(stem("!!!"), "___");
        assert_eq!(stem("  "), "concept_summary");
    }

    #[test]
    fn test_parses_model_output_with_gaps() {
        let summary: VideoConceptSummary = serde_json::from_value(json!({
            "videoTitleSuggestion": "Roots of Tomorrow",
            "coreConcept": null,
            "targetAudience": { "description": "Students" },
            "keyMessages": ["Plant trees"],
            "contentStructureOutline": [{ "section": "Introduction", "description": null }],
        }))
        .unwrap();

        assert_eq!(summary.video_title_suggestion, "Roots of Tomorrow");
        assert_eq!(summary.core_concept, "");
        assert!(summary.target_audience.key_takeaways.is_empty());
        assert_eq!(summary.content_structure_outline[0].description, "");
        assert!(summary.saved_at.is_none());
    }

    #[test]
    fn test_timestamps_accept_store_shapes() {
        let summary: VideoConceptSummary = serde_json::from_value(json!({
            "videoTitleSuggestion": "T",
            "savedAt": { "_seconds": 1_700_000_000, "_nanoseconds": 0 },
            "lastUpdatedAt": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(summary.saved_at.unwrap().timestamp(), 1_700_000_000);
        assert!(summary.last_updated_at.is_some());
    }

    #[test]
    fn test_meaningful_notes() {
        let mut summary = VideoConceptSummary::default();
        assert!(summary.meaningful_notes().is_none());
        summary.additional_notes = "not specified".into();
        assert!(summary.meaningful_notes().is_none());
        summary.additional_notes = " Shoot at dawn ".into();
        assert_eq!(summary.meaningful_notes(), Some("Shoot at dawn"));
    }
}
