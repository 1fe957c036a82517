//! Completion backends
//!
//! [`CompletionBackend`] is the seam between the [`crate::Translator`] and the
//! network. [`HttpCompletionBackend`] talks to any OpenAI-compatible
//! `/chat/completions` endpoint (LM Studio, Ollama, OpenAI).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::core::config::EndpointConfig;
use crate::core::errors::{Result, TranslationError};

/// One chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `user`, `system` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Message with the `user` role
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Structured-output request attached to a completion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Reply must validate against `json_schema.schema`
    JsonSchema {
        /// Named schema the reply must follow
        json_schema: JsonSchemaFormat,
    },
}

/// Named JSON schema for structured output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaFormat {
    /// Schema name reported to the server
    pub name: String,
    /// The schema itself
    pub schema: Value,
    /// Ask the server to enforce the schema exactly
    pub strict: bool,
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model name without provider prefix
    pub model: String,
    /// Conversation sent to the model
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Structured-output constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

/// Something that turns a completion request into reply text
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send `request` and return the text of the first choice
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Name used in logs
    fn backend_name(&self) -> &str;
}

/// OpenAI-compatible HTTP backend
#[derive(Debug, Clone)]
pub struct HttpCompletionBackend {
    client: reqwest::Client,
    endpoint: EndpointConfig,
}

impl HttpCompletionBackend {
    /// Create a backend for a validated endpoint
    pub fn new(endpoint: EndpointConfig) -> Result<Self> {
        endpoint.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(endpoint.timeout_ms))
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Full URL of the chat completions route
    pub fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.endpoint.api_base.trim().trim_end_matches('/')
        )
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self.completions_url();
        debug!("POST {} (model {})", url, request.model);

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request);

        if let Some(api_key) = &self.endpoint.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TranslationError::TimeoutError
            } else {
                TranslationError::NetworkError {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TranslationError::TimeoutError
            } else {
                TranslationError::NetworkError {
                    message: e.to_string(),
                }
            }
        })?;

        if !status.is_success() {
            return Err(TranslationError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| TranslationError::InvalidResponseError {
                message: format!("completion envelope is not valid JSON: {}", e),
            })?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslationError::InvalidResponseError {
                message: "No content in completion response".to_string(),
            })
    }

    fn backend_name(&self) -> &str {
        "openai-compatible http"
    }
}
