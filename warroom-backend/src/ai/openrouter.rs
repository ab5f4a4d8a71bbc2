use reqwest::{header, Client};
use serde::Deserialize;
use std::time::Duration;

use super::types::{AiError, ChatReply, ChatRequest, ToolCallSummary};

/// OpenAI-compatible chat-completions client pointed at OpenRouter.
/// One request per call; no retries.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ResponseToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    function: Option<ResponseFunction>,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, endpoint: &str, timeout: Duration) -> Result<Self, String> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        auth_headers.insert(header::AUTHORIZATION, auth_value);

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            auth_headers,
            endpoint: endpoint.to_string(),
        })
    }

    pub async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, AiError> {
        log::debug!(
            "[OPENROUTER] Sending request to {} with model {} (provider hint: {})",
            self.endpoint,
            request.model,
            request.provider.is_some()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::new(format!("OpenRouter request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AiError::new(format!("Failed to read OpenRouter response: {}", e)))?;

        if !status.is_success() {
            return Err(AiError::with_status(
                describe_error_status(status.as_u16(), &body),
                status.as_u16(),
            ));
        }

        parse_completion_body(&body)
    }
}

/// Human-readable message for a non-2xx response
fn describe_error_status(status: u16, body: &str) -> String {
    if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(body) {
        return format!("OpenRouter API error ({}): {}", status, error_response.error.message);
    }

    let trimmed = body.trim_start();
    if trimmed.starts_with("<!DOCTYPE") || trimmed.starts_with("<html") || trimmed.starts_with("<HTML") {
        return format!("OpenRouter API returned error status {} (HTML error page)", status);
    }

    let snippet: String = body.chars().take(200).collect();
    if snippet.len() < body.len() {
        format!("OpenRouter API returned error status {}, body: {}...", status, snippet)
    } else {
        format!("OpenRouter API returned error status {}, body: {}", status, snippet)
    }
}

/// Reduce a completion body to its first choice
pub fn parse_completion_body(body: &str) -> Result<ChatReply, AiError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| AiError::new(format!("Failed to parse OpenRouter response: {}", e)))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AiError::new("OpenRouter API returned no choices"))?;

    let tool_calls = choice
        .message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| {
            let (name, arguments) = match call.function {
                Some(f) => (f.name, f.arguments),
                None => (None, None),
            };
            ToolCallSummary { name, arguments }
        })
        .collect();

    Ok(ChatReply {
        content: choice.message.content,
        tool_calls,
    })
}
