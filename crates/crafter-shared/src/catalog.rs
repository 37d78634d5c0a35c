//! The fixed, ordered list of topics the guided dialog collects.
//!
//! Catalog order matters: the dialog opens on the first topic, and when more
//! than one topic matches an assistant message the earliest entry wins.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::GREETING;
use crate::error::SharedError;

/// A topic key the dialog collects an answer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    ConceptDetails,
    VisualStyle,
    TargetAudience,
    KeyMessages,
    MoodTone,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ConceptDetails,
        Category::VisualStyle,
        Category::TargetAudience,
        Category::KeyMessages,
        Category::MoodTone,
    ];

    /// Wire key, e.g. `"visualStyle"`.
    pub fn key(&self) -> &'static str {
        match self {
            Category::ConceptDetails => "conceptDetails",
            Category::VisualStyle => "visualStyle",
            Category::TargetAudience => "targetAudience",
            Category::KeyMessages => "keyMessages",
            Category::MoodTone => "moodTone",
        }
    }

    /// Position of this category in [`CATALOG`].
    pub fn index(&self) -> usize {
        CATALOG
            .iter()
            .position(|t| t.category == *self)
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.key() == s)
            .ok_or_else(|| SharedError::UnknownCategory(s.to_string()))
    }
}

/// One catalog entry: the prompt the assistant asks and the category it fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topic {
    pub id: &'static str,
    pub prompt: &'static str,
    pub category: Category,
}

pub const CATALOG: [Topic; 5] = [
    Topic {
        id: "concept-main",
        prompt: "What's the main concept or idea you'd like to develop into a video?",
        category: Category::ConceptDetails,
    },
    Topic {
        id: "visual-style",
        prompt: "How would you describe the visual style you're looking for? (e.g., minimalist, vibrant, corporate, artistic)",
        category: Category::VisualStyle,
    },
    Topic {
        id: "target-audience",
        prompt: "Who is the target audience for this video?",
        category: Category::TargetAudience,
    },
    Topic {
        id: "key-messages",
        prompt: "What are the key messages or points you want to communicate?",
        category: Category::KeyMessages,
    },
    Topic {
        id: "mood-tone",
        prompt: "What mood or emotional tone should the video have?",
        category: Category::MoodTone,
    },
];

/// The synthetic opening message: greeting followed by the first prompt.
pub fn opening_prompt() -> String {
    format!("{} {}", GREETING, CATALOG[0].prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_categories() {
        for (i, topic) in CATALOG.iter().enumerate() {
            assert_eq!(topic.category, Category::ALL[i]);
            assert_eq!(topic.category.index(), i);
        }
    }

    #[test]
    fn test_category_key_roundtrip() {
        for c in Category::ALL {
            assert_eq!(c.key().parse::<Category>().unwrap(), c);
            assert_eq!(serde_json::to_string(&c).unwrap(), format!("\"{}\"", c.key()));
        }
        assert!("mood_tone".parse::<Category>().is_err());
    }

    #[test]
    fn test_opening_prompt_contains_first_topic() {
        let prompt = opening_prompt();
        assert!(prompt.starts_with(GREETING));
        assert!(prompt.ends_with(CATALOG[0].prompt));
    }
}
