//! Custom error types for translation operations

use std::fmt;
use thiserror::Error;

/// Coarse classification of a [`TranslationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The model reply is not JSON, does not match the batch schema,
    /// or does not line up with the submitted entries
    MalformedResponse,
    /// The completion call itself failed
    Transport,
    /// Model, prompt or endpoint configuration is unusable
    Configuration,
    /// The submitted batch violates the input constraints
    InvalidInput,
    /// Serialization failure inside the crate
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::MalformedResponse => write!(f, "malformed-response"),
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Configuration => write!(f, "configuration"),
            ErrorKind::InvalidInput => write!(f, "invalid-input"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// Translation-related errors
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Endpoint answered with a non-success status
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Network error
    #[error("Network error: {message}")]
    NetworkError {
        /// What went wrong
        message: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    TimeoutError,

    /// Completion envelope could not be used (no choices, no content)
    #[error("Invalid response: {message}")]
    InvalidResponseError {
        /// What went wrong
        message: String,
    },

    /// Model reply is not valid JSON or does not match the batch schema
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What went wrong
        message: String,
    },

    /// Returned ids do not match the submitted ids one to one
    #[error(
        "Misaligned response: missing [{}], unexpected [{}], duplicated [{}]",
        .missing.join(", "),
        .unexpected.join(", "),
        .duplicated.join(", ")
    )]
    MisalignedResponse {
        /// Submitted ids absent from the reply
        missing: Vec<String>,
        /// Reply ids that were never submitted
        unexpected: Vec<String>,
        /// Ids returned more than once
        duplicated: Vec<String>,
    },

    /// Submitted batch is not acceptable
    #[error("Invalid batch: {message}")]
    InvalidBatch {
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// What went wrong
        message: String,
    },

    /// Reqwest error
    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl TranslationError {
    /// Shorthand for a [`TranslationError::MalformedResponse`]
    pub fn malformed(message: impl Into<String>) -> Self {
        TranslationError::MalformedResponse {
            message: message.into(),
        }
    }

    /// Shorthand for a [`TranslationError::ConfigError`]
    pub fn config(message: impl Into<String>) -> Self {
        TranslationError::ConfigError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`TranslationError::InvalidBatch`]
    pub fn invalid_batch(message: impl Into<String>) -> Self {
        TranslationError::InvalidBatch {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TranslationError::MalformedResponse { .. }
            | TranslationError::MisalignedResponse { .. } => ErrorKind::MalformedResponse,
            TranslationError::ApiError { .. }
            | TranslationError::NetworkError { .. }
            | TranslationError::TimeoutError
            | TranslationError::InvalidResponseError { .. }
            | TranslationError::HttpError(_) => ErrorKind::Transport,
            TranslationError::ConfigError { .. } => ErrorKind::Configuration,
            TranslationError::InvalidBatch { .. } => ErrorKind::InvalidInput,
            TranslationError::JsonError(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for translation operations
pub type Result<T> = std::result::Result<T, TranslationError>;
