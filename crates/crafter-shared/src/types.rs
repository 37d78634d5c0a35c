use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Category;
use crate::constants::TOKEN_LEN;
use crate::timestamp;

fn short_token() -> String {
    Uuid::new_v4().simple().to_string()[..TOKEN_LEN].to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new() -> Self {
        Self(short_token())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(short_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(alias = "ai", alias = "model")]
    Assistant,
}

/// A single chat message. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    #[serde(with = "timestamp::flexible")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Accumulated answer text per category.
///
/// A category's value is only ever extended: later answers are appended with
/// a `". "` separator, the first one is stored verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConceptData(BTreeMap<Category, String>);

impl ConceptData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.0.get(&category).map(String::as_str)
    }

    /// Append `text` to the category, returning the merged value.
    pub fn append(&mut self, category: Category, text: &str) -> &str {
        let entry = self
            .0
            .entry(category)
            .and_modify(|existing| {
                existing.push_str(". ");
                existing.push_str(text);
            })
            .or_insert_with(|| text.to_string());
        entry.as_str()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains_key(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &str)> {
        self.0.iter().map(|(c, v)| (*c, v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_joins_with_period() {
        let mut data = ConceptData::new();
        assert_eq!(data.append(Category::VisualStyle, "minimalist"), "minimalist");
        assert_eq!(
            data.append(Category::VisualStyle, "lots of white space"),
            "minimalist. lots of white space"
        );
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_concept_data_wire_shape() {
        let mut data = ConceptData::new();
        data.append(Category::MoodTone, "calm");
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({ "moodTone": "calm" }));
    }

    #[test]
    fn test_message_accepts_legacy_shapes() {
        let msg: Message = serde_json::from_value(json!({
            "id": "abc12345",
            "role": "ai",
            "content": "hello",
            "timestamp": 1_700_000_000_000i64,
        }))
        .unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.timestamp.timestamp(), 1_700_000_000);

        let wire = serde_json::to_value(&msg).unwrap();
        assert_eq!(wire["role"], "assistant");
    }

    #[test]
    fn test_tokens_are_short_and_distinct() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_eq!(a.as_str().len(), TOKEN_LEN);
        assert_ne!(a, b);
    }
}
