//! Configuration management

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{ModelRef, Provider};
use crate::core::response::ParseMode;

/// Model used when neither the environment nor the CLI names one
pub const DEFAULT_MODEL: &str = "lm_studio/llama-3-8b-instruct";
/// Source locale when none is configured
pub const DEFAULT_SOURCE_LOCALE: &str = "en-US";
/// Target locale when none is configured
pub const DEFAULT_TARGET_LOCALE: &str = "es-MX";
/// Request timeout; local inference can be slow
pub const DEFAULT_TIMEOUT_MS: u64 = 120_000;

/// Human-readable names for the locales the preamble commonly mentions
const LOCALE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("en-US", "American English"),
    ("en-GB", "British English"),
    ("es", "Spanish"),
    ("es-ES", "European Spanish"),
    ("es-MX", "Mexican Spanish"),
    ("fr", "French"),
    ("fr-FR", "French"),
    ("fr-CA", "Canadian French"),
    ("de", "German"),
    ("de-DE", "German"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("pt-BR", "Brazilian Portuguese"),
    ("pt-PT", "European Portuguese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh-CN", "Simplified Chinese"),
    ("zh-TW", "Traditional Chinese"),
];

/// Display name for a locale code, falling back to the code itself
pub fn locale_display_name(code: &str) -> &str {
    LOCALE_NAMES
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

/// Standard translator instruction for a locale pair
pub fn default_preamble(source_locale: &str, target_locale: &str) -> String {
    format!(
        "You are a professional translator. Translate the following {source_name} strings \
         ({source}) into {target_name} ({target}). Each entry is a short UI string; use its \
         context to choose the right wording and keep the translation about as long as the \
         source. Keep the id, context and source of every entry unchanged and fill in only \
         the target. Return **exactly** a JSON object that matches the following schema:",
        source_name = locale_display_name(source_locale),
        source = source_locale,
        target_name = locale_display_name(target_locale),
        target = target_locale,
    )
}

/// Configuration for [`crate::Translator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    /// Model identifier, optionally prefixed with a provider (`lm_studio/...`)
    pub model: String,
    /// Instruction placed at the top of every prompt
    pub preamble: String,
    /// Sampling temperature, server default when unset
    pub temperature: Option<f32>,
    /// How strictly replies are parsed
    pub parse_mode: ParseMode,
    /// Require every submitted id to come back exactly once
    pub verify_alignment: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            preamble: default_preamble(DEFAULT_SOURCE_LOCALE, DEFAULT_TARGET_LOCALE),
            temperature: None,
            parse_mode: ParseMode::Lenient,
            verify_alignment: true,
        }
    }
}

impl TranslatorConfig {
    /// Config with the given model and preamble, other settings at their defaults
    pub fn new(model: impl Into<String>, preamble: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            preamble: preamble.into(),
            ..Default::default()
        }
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = lookup("LOCALE_TRANSLATOR_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let source_locale =
            lookup("SOURCE_LOCALE").unwrap_or_else(|| DEFAULT_SOURCE_LOCALE.to_string());
        let target_locale =
            lookup("TARGET_LOCALE").unwrap_or_else(|| DEFAULT_TARGET_LOCALE.to_string());

        Ok(Self::new(model, default_preamble(&source_locale, &target_locale)))
    }

    /// Provider and bare model name
    pub fn model_ref(&self) -> ModelRef {
        ModelRef::parse(&self.model)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(TranslationError::config("model identifier is required"));
        }

        if self.model_ref().name.trim().is_empty() {
            return Err(TranslationError::config(format!(
                "model identifier '{}' names a provider but no model",
                self.model
            )));
        }

        if self.preamble.trim().is_empty() {
            return Err(TranslationError::config("instruction preamble is required"));
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(TranslationError::config(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                )));
            }
        }

        Ok(())
    }
}

/// Where and how to reach the completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Provider this endpoint belongs to
    pub provider: Provider,
    /// Base URL up to and including the API version, e.g. `http://localhost:1234/v1`
    pub api_base: String,
    /// Sent as a bearer token when present
    pub api_key: Option<String>,
    /// Whole-request timeout
    pub timeout_ms: u64,
}

impl EndpointConfig {
    /// Endpoint at the provider's default address
    pub fn for_provider(provider: Provider) -> Self {
        Self {
            provider,
            api_base: provider.default_base_url().to_string(),
            api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Load the endpoint for `provider` from an arbitrary variable lookup
    pub fn from_vars<F>(provider: Provider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup(provider.base_url_var())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| provider.default_base_url().to_string());

        let api_key = provider
            .api_key_var()
            .and_then(|var| lookup(var))
            .filter(|v| !v.trim().is_empty());

        let timeout_ms = match lookup("REQUEST_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                TranslationError::config(format!("REQUEST_TIMEOUT_MS '{}': {}", raw, e))
            })?,
            None => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            provider,
            api_base,
            api_key,
            timeout_ms,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let base = self.api_base.trim();
        if base.is_empty() {
            return Err(TranslationError::config("API base URL is required"));
        }

        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(TranslationError::config(format!(
                "API base URL must start with http:// or https://, got '{}'",
                base
            )));
        }

        if self.timeout_ms == 0 {
            return Err(TranslationError::config("timeout_ms must be greater than 0"));
        }

        if self.provider.requires_api_key() && self.api_key.is_none() {
            return Err(TranslationError::config(format!(
                "{} requires an API key ({})",
                self.provider,
                self.provider.api_key_var().unwrap_or("api key")
            )));
        }

        Ok(())
    }
}
