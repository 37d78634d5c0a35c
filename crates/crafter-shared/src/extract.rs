//! Post-hoc keyword tagging of a finished conversation.
//!
//! Everything here is simple substring containment over lower-cased text.
//! The confidence scores are informational; no control flow depends on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::timestamp;
use crate::types::{ConceptData, Message, Role};

/// Acknowledgements that carry no content.
const STOPLIST: [&str; 4] = ["no", "yes", "ok", "okay"];

/// Messages shorter than this (after trimming) are dropped.
const MIN_CONTENT_LEN: usize = 3;

/// A finished conversation as handed to the extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedConversation {
    pub id: String,
    pub session_id: String,
    #[serde(default, with = "timestamp::flexible_option", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub concept_data: ConceptData,
    pub messages: Vec<Message>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    pub concept_details: String,
    pub key_messages: Vec<String>,
    pub visual_style: String,
    pub target_audience: Vec<String>,
    pub mood_tone: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceScores {
    pub concept_clarity: f64,
    pub style_specificity: f64,
    pub audience_clarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedConversation {
    pub id: String,
    #[serde(default, with = "timestamp::flexible_option", skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub session_id: String,
    pub extracted_data: ExtractedData,
    pub semantic_tags: Vec<String>,
    pub processed_messages: Vec<Message>,
    pub confidence_scores: ConfidenceScores,
}

/// Fixed topic labels the extractor tags messages with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicLabel {
    VisualStyle,
    TargetAudience,
    MoodTone,
    KeyMessage,
}

impl TopicLabel {
    pub const ALL: [TopicLabel; 4] = [
        TopicLabel::VisualStyle,
        TopicLabel::TargetAudience,
        TopicLabel::MoodTone,
        TopicLabel::KeyMessage,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            TopicLabel::VisualStyle => "visual_style",
            TopicLabel::TargetAudience => "target_audience",
            TopicLabel::MoodTone => "mood_tone",
            TopicLabel::KeyMessage => "key_message",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            TopicLabel::VisualStyle => &["minimalist", "vibrant", "color", "style", "visual", "design"],
            TopicLabel::TargetAudience => &["audience", "target", "viewer", "people", "user"],
            TopicLabel::MoodTone => &["calm", "inspired", "emotional", "mood", "tone", "feeling"],
            TopicLabel::KeyMessage => &["message", "point", "takeaway", "key", "important"],
        }
    }

    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords().iter().any(|k| lowered.contains(k))
    }
}

/// Tags and user-authored text collected per label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemanticInfo {
    pub tags: Vec<String>,
    pub key_messages: Vec<String>,
    pub target_audience: Vec<String>,
    pub mood_tone: Vec<String>,
}

struct ScoreRule {
    length_divisor: f64,
    count_divisor: f64,
    weight: f64,
}

const CONCEPT_CLARITY: ScoreRule = ScoreRule { length_divisor: 50.0, count_divisor: 3.0, weight: 0.5 };
const STYLE_SPECIFICITY: ScoreRule = ScoreRule { length_divisor: 20.0, count_divisor: 2.0, weight: 0.5 };
const AUDIENCE_CLARITY: ScoreRule = ScoreRule { length_divisor: 2.0, count_divisor: 2.0, weight: 0.5 };

impl ScoreRule {
    fn score(&self, length: usize, count: usize) -> f64 {
        let raw = (length as f64 / self.length_divisor + count as f64 / self.count_divisor) * self.weight;
        raw.min(1.0)
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Very short messages and bare acknowledgements.
pub fn is_trivial(content: &str) -> bool {
    let lowered = content.trim().to_lowercase();
    lowered.chars().count() < MIN_CONTENT_LEN || STOPLIST.contains(&lowered.as_str())
}

pub fn filter_trivial(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| !is_trivial(&m.content))
        .cloned()
        .collect()
}

pub fn extract_semantic_info(messages: &[Message]) -> SemanticInfo {
    let mut info = SemanticInfo::default();

    for message in messages {
        let lowered = message.content.to_lowercase();
        for label in TopicLabel::ALL {
            if !label.matches(&lowered) {
                continue;
            }
            push_unique(&mut info.tags, label.tag());
            if message.role != Role::User {
                continue;
            }
            let target = match label {
                TopicLabel::KeyMessage => &mut info.key_messages,
                TopicLabel::MoodTone => &mut info.mood_tone,
                TopicLabel::TargetAudience => &mut info.target_audience,
                TopicLabel::VisualStyle => continue,
            };
            push_unique(target, &message.content);
        }
    }

    info
}

/// Replies that directly follow an assistant question about audience or mood.
fn answers_to_questions(messages: &[Message]) -> (Vec<String>, Vec<String>) {
    let mut audience = Vec::new();
    let mut mood = Vec::new();

    for pair in messages.windows(2) {
        let (question, answer) = (&pair[0], &pair[1]);
        if question.role != Role::Assistant {
            continue;
        }
        let lowered = question.content.to_lowercase();
        if lowered.contains("target audience") || lowered.contains("who is your audience") {
            audience.push(answer.content.clone());
        } else if lowered.contains("mood") || lowered.contains("tone") || lowered.contains("feeling") {
            mood.push(answer.content.clone());
        }
    }

    (audience, mood)
}

pub fn confidence_scores(data: &ExtractedData, tags: &[String]) -> ConfidenceScores {
    let tagged = |needle: &str| tags.iter().filter(|t| t.contains(needle)).count();

    ConfidenceScores {
        concept_clarity: CONCEPT_CLARITY
            .score(data.concept_details.chars().count(), data.key_messages.len()),
        style_specificity: STYLE_SPECIFICITY.score(
            data.visual_style.chars().count(),
            tagged(TopicLabel::VisualStyle.tag()),
        ),
        audience_clarity: AUDIENCE_CLARITY.score(
            data.target_audience.len(),
            tagged(TopicLabel::TargetAudience.tag()),
        ),
    }
}

/// Run the full extraction over a finished conversation.
pub fn process_conversation(conversation: &CompletedConversation) -> ProcessedConversation {
    let concept = &conversation.concept_data;
    let (mut target_audience, mut mood_tone) = answers_to_questions(&conversation.messages);

    let processed_messages = filter_trivial(&conversation.messages);
    let semantic = extract_semantic_info(&processed_messages);

    let mut key_messages: Vec<String> = concept
        .get(Category::KeyMessages)
        .map(|k| vec![k.to_string()])
        .unwrap_or_default();
    if key_messages.is_empty() {
        key_messages = semantic.key_messages;
    }
    if target_audience.is_empty() {
        target_audience = semantic.target_audience;
    }
    if mood_tone.is_empty() {
        mood_tone = semantic.mood_tone;
    }

    let extracted_data = ExtractedData {
        concept_details: concept.get(Category::ConceptDetails).unwrap_or_default().to_string(),
        key_messages,
        visual_style: concept.get(Category::VisualStyle).unwrap_or_default().to_string(),
        target_audience,
        mood_tone,
    };
    let confidence_scores = confidence_scores(&extracted_data, &semantic.tags);

    ProcessedConversation {
        id: conversation.id.clone(),
        completed_at: conversation.completed_at,
        session_id: conversation.session_id.clone(),
        extracted_data,
        semantic_tags: semantic.tags,
        processed_messages,
        confidence_scores,
    }
}
