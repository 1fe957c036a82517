//! Locale Translator - batch UI string translation through an LLM
//!
//! A [`Batch`] of [`Entry`] values (id, context, source, target) is rendered
//! into a single prompt together with the JSON schema the reply must follow,
//! sent to a chat completion endpoint, and the reply is parsed and validated
//! back into a [`Batch`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;

// Re-export key types for convenience
pub use crate::core::{
    backend::{CompletionBackend, CompletionRequest, HttpCompletionBackend},
    client::Translator,
    config::{EndpointConfig, TranslatorConfig},
    errors::{ErrorKind, Result, TranslationError},
    mock::MockCompletion,
    models::{Batch, Entry, ModelRef, Provider},
    response::ParseMode,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
