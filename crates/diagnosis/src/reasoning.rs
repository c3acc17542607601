//! Reasoning service client.
//!
//! The service accepts a role-tagged message list and returns free text.
//! [`OpenAiReasoner`] talks to any OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// OpenAI API endpoint
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Errors from the reasoning service.
#[derive(Debug, Error)]
pub enum ReasoningError {
    #[error("reasoning service is not configured: {0}")]
    NotConfigured(&'static str),

    #[error("reasoning request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("reasoning service error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("failed to parse reasoning response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reasoning service returned no content")]
    EmptyResponse,
}

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
}

/// A message sent to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Anything that can turn a conversation into a free-text answer.
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Get the service name (e.g., "openai").
    fn name(&self) -> &'static str;

    /// Complete the conversation, returning the reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

/// OpenAI-compatible chat completions client.
pub struct OpenAiReasoner {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiReasoner {
    #[must_use]
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: OPENAI_API_URL.to_string(),
            model: model.into(),
            timeout,
        }
    }

    /// Set a custom endpoint (useful for Azure OpenAI or proxies).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl ReasoningService for OpenAiReasoner {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ReasoningError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ReasoningError::NotConfigured("OPENAI_API_KEY not set"))?;

        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map_or(body, |error_response| error_response.error.message);
            return Err(ReasoningError::Api { status, message });
        }

        let chat: ChatResponse = serde_json::from_str(&body)?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ReasoningError::EmptyResponse)
    }
}
