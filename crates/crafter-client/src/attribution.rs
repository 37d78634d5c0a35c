//! Deciding which catalog topic a user answer belongs to.

use crafter_shared::catalog::Topic;
use crafter_shared::{Category, Message, Role, CATALOG};

/// Characters of a topic prompt that must be echoed by the assistant.
const PROMPT_PREFIX_LEN: usize = 20;

/// Strategy for attributing the latest user answer to a topic.
pub trait TopicAttribution: Send + Sync {
    /// `history` is the gateway history ending with the answer to attribute.
    /// `None` leaves the answer unattributed.
    fn attribute(&self, history: &[Message]) -> Option<Category>;
}

/// Matches the assistant message preceding the answer against each topic's
/// prompt prefix or spelled-out category key.
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptEchoMatcher;

fn echoes(topic: &Topic, assistant_text: &str) -> bool {
    let prefix: String = topic
        .prompt
        .to_lowercase()
        .chars()
        .take(PROMPT_PREFIX_LEN)
        .collect();
    let key = topic.category.key().to_lowercase().replace('_', " ");

    assistant_text.contains(&prefix) || assistant_text.contains(&key)
}

impl TopicAttribution for PromptEchoMatcher {
    fn attribute(&self, history: &[Message]) -> Option<Category> {
        let (latest, earlier) = history.split_last()?;
        if !latest.is_user() {
            return None;
        }

        // The opening question is never in the gateway history.
        let Some(preceding) = earlier.last() else {
            return Some(CATALOG[0].category);
        };
        if preceding.role != Role::Assistant {
            return None;
        }

        let text = preceding.content.to_lowercase();
        CATALOG
            .iter()
            .find(|topic| echoes(topic, &text))
            .map(|topic| topic.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(history: &[Message]) -> Option<Category> {
        PromptEchoMatcher.attribute(history)
    }

    #[test]
    fn test_first_answer_is_first_topic() {
        assert_eq!(
            attribute(&[Message::user("anything at all")]),
            Some(Category::ConceptDetails)
        );
    }

    #[test]
    fn test_prompt_echo_matches() {
        let history = [
            Message::user("A film about bees"),
            Message::assistant("Lovely! Who is the target audience for this video?"),
            Message::user("Kids"),
        ];
        assert_eq!(attribute(&history), Some(Category::TargetAudience));
    }

    #[test]
    fn test_category_key_matches() {
        let history = [
            Message::user("A film about bees"),
            Message::assistant("Tell me more about the moodtone you want."),
            Message::user("Playful"),
        ];
        assert_eq!(attribute(&history), Some(Category::MoodTone));
    }

    #[test]
    fn test_follow_up_is_unattributed() {
        let history = [
            Message::user("A film"),
            Message::assistant("Could you say a bit more about that?"),
            Message::user("About bees"),
        ];
        assert_eq!(attribute(&history), None);
    }

    #[test]
    fn test_overlap_resolves_to_first_entry() {
        let history = [
            Message::user("A film"),
            Message::assistant(
                "What mood or emotional tone should it have? And who is the target audience for this?",
            ),
            Message::user("Calm, for adults"),
        ];
        assert_eq!(attribute(&history), Some(Category::TargetAudience));
    }

    #[test]
    fn test_requires_trailing_user_message() {
        assert_eq!(attribute(&[]), None);
        assert_eq!(attribute(&[Message::assistant("hi")]), None);
    }
}
