use serde::{Deserialize, Serialize};

use super::Message;

/// Error from a completion call. Carries the HTTP status when there was one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiError {
    pub message: String,
    pub status_code: Option<u16>,
}

impl AiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        Self {
            message: message.into(),
            status_code: Some(status_code),
        }
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AiError {}

impl From<String> for AiError {
    fn from(message: String) -> Self {
        AiError::new(message)
    }
}

/// Provider routing hint understood by OpenRouter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRouting {
    pub order: Vec<String>,
    pub allow_fallbacks: bool,
}

impl ProviderRouting {
    /// Pin the request to Google so Gemini grounding is available
    pub fn google_only() -> Self {
        Self {
            order: vec!["Google".to_string()],
            allow_fallbacks: false,
        }
    }
}

/// Body of a chat-completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderRouting>,
}

#[cfg(test)]
impl ChatRequest {
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == super::MessageRole::System)
            .map(|m| m.content.as_str())
    }

    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == super::MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A tool call the model emitted instead of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallSummary {
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// First choice of a completion, reduced to what the council uses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallSummary>,
}

/// What a reply amounts to once empty and tool-call replies are told apart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyText {
    Text(String),
    ToolCallAttempt { arguments: String },
    Empty,
}

impl ChatReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn classify(&self) -> ReplyText {
        match self.content.as_deref() {
            Some(text) if !text.trim().is_empty() => ReplyText::Text(text.to_string()),
            _ => match self.tool_calls.first() {
                Some(call) => ReplyText::ToolCallAttempt {
                    arguments: call.arguments.clone().unwrap_or_else(|| "N/A".to_string()),
                },
                None => ReplyText::Empty,
            },
        }
    }
}
