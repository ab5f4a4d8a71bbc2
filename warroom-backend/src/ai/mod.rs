pub mod openrouter;
pub mod types;

pub use openrouter::OpenRouterClient;
pub use types::{AiError, ChatReply, ChatRequest, ProviderRouting, ReplyText, ToolCallSummary};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Chat-completion backend used by the council
#[derive(Clone)]
pub enum CompletionClient {
    OpenRouter(OpenRouterClient),
    Mock(MockCompletionClient),
}

impl CompletionClient {
    pub fn openrouter(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self, String> {
        Ok(CompletionClient::OpenRouter(OpenRouterClient::new(api_key, endpoint, timeout)?))
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, AiError> {
        match self {
            CompletionClient::OpenRouter(client) => client.complete(request).await,
            CompletionClient::Mock(client) => client.complete(request).await,
        }
    }
}

/// Mock completion client for tests. Replies are configured per model;
/// models without a configured reply echo a canned text. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockCompletionClient {
    replies: Arc<Mutex<HashMap<String, Result<ChatReply, AiError>>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, model: &str, reply: Result<ChatReply, AiError>) -> Self {
        lock(&self.replies).insert(model.to_string(), reply);
        self
    }

    pub fn with_text(self, model: &str, text: &str) -> Self {
        self.with_reply(model, Ok(ChatReply::text(text)))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, AiError> {
        lock(&self.requests).push(request.clone());

        let delay = lock(&self.delays).get(&request.model).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = lock(&self.replies).get(&request.model).cloned();
        reply.unwrap_or_else(|| Ok(ChatReply::text(format!("(mock reply from {})", request.model))))
    }
}

#[cfg(test)]
impl MockCompletionClient {
    /// Hold the reply for `model` back by `delay`
    pub fn with_delay(self, model: &str, delay: Duration) -> Self {
        lock(&self.delays).insert(model.to_string(), delay);
        self
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    pub fn request_for(&self, model: &str) -> Option<ChatRequest> {
        lock(&self.requests).iter().find(|r| r.model == model).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serializes_lowercase_role() {
        let json = serde_json::to_value(Message::system("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "hi"}));
    }

    #[test]
    fn test_request_omits_absent_provider() {
        let request = ChatRequest {
            model: "openai/gpt-4o".to_string(),
            messages: vec![Message::system("s"), Message::user("u")],
            provider: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("provider").is_none());
        assert_eq!(request.system_prompt(), Some("s"));
        assert_eq!(request.user_prompt(), Some("u"));
    }

    #[tokio::test]
    async fn test_mock_records_requests_and_uses_configured_replies() {
        let mock = MockCompletionClient::new()
            .with_text("m/one", "first")
            .with_reply("m/two", Err(AiError::with_status("boom", 500)));
        let client = CompletionClient::Mock(mock.clone());

        let one = ChatRequest { model: "m/one".to_string(), messages: vec![], provider: None };
        let two = ChatRequest { model: "m/two".to_string(), messages: vec![], provider: None };
        let three = ChatRequest { model: "m/three".to_string(), messages: vec![], provider: None };

        assert_eq!(client.complete(&one).await.unwrap().content.as_deref(), Some("first"));
        assert_eq!(client.complete(&two).await.unwrap_err().status_code, Some(500));
        assert!(client.complete(&three).await.unwrap().content.unwrap().contains("m/three"));
        assert_eq!(mock.requests().len(), 3);
    }
}
