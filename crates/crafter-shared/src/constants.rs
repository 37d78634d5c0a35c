/// Application name
pub const APP_NAME: &str = "ConceptCrafter";

/// Author recorded in exported document metadata
pub const DOCUMENT_AUTHOR: &str = "ConceptCrafterAI";

/// Literal token the model emits once every topic is covered
pub const COMPLETION_MARKER: &str = "[CONVERSATION_COMPLETE]";

/// Upstream error text that signals a content-safety rejection (matched case-insensitively)
pub const SAFETY_REJECTION_PATTERN: &str = "response blocked due to safety settings";

/// Error text returned by the chat gateway when the model refused for safety reasons
pub const SAFETY_REJECTION_MESSAGE: &str =
    "Response blocked due to safety settings. Please rephrase your input.";

/// Greeting shown ahead of the first topic prompt
pub const GREETING: &str = "Hi there! I'm your concept generation assistant. I'll help you develop your video idea by asking a few questions. Let's get started!";

/// Placeholder for fields the conversation never determined
pub const NOT_SPECIFIED: &str = "Not specified";

/// Upper bound for the target video duration, in minutes
pub const MAX_DURATION_MINUTES: f64 = 1.0;

/// Length of generated message and session tokens
pub const TOKEN_LEN: usize = 8;

/// Default HTTP API port (server)
pub const DEFAULT_HTTP_PORT: u16 = 3001;
