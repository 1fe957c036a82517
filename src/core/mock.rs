//! Canned completion backend for testing
//!
//! Lets the translation flow run without a model server. Every request is
//! recorded so tests can inspect the prompt that would have been sent.
//!
//! # Example
//!
//! ```ignore
//! use locale_translator::{MockCompletion, Translator, TranslatorConfig};
//! use std::sync::Arc;
//!
//! let mock = Arc::new(MockCompletion::replying(r#"{"batch":[]}"#));
//! let translator = Translator::new(TranslatorConfig::default(), mock.clone())?;
//! ```

use async_trait::async_trait;
use std::sync::Mutex;

use crate::core::backend::{CompletionBackend, CompletionRequest};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::Batch;

/// What the mock does when asked for a completion
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Return this text verbatim
    Reply(String),
    /// Fail with a network error carrying this message
    NetworkFailure(String),
}

/// Completion backend returning canned replies
#[derive(Debug)]
pub struct MockCompletion {
    mode: MockMode,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletion {
    /// Mock behaving as `mode` says
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with `text` to every request
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockMode::Reply(text.into()))
    }

    /// Reply with the JSON form of `batch`
    pub fn replying_with_batch(batch: &Batch) -> Result<Self> {
        Ok(Self::replying(serde_json::to_string(batch)?))
    }

    /// Fail every request with a network error
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(MockMode::NetworkFailure(message.into()))
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CompletionBackend for MockCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        match &self.mode {
            MockMode::Reply(text) => Ok(text.clone()),
            MockMode::NetworkFailure(message) => Err(TranslationError::NetworkError {
                message: message.clone(),
            }),
        }
    }

    fn backend_name(&self) -> &str {
        "mock"
    }
}
