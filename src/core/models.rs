//! Core data models for translation
//!
//! Wire mapping used by [`Entry`] and [`Batch`]:
//!
//! | field            | key       | on parse            |
//! |------------------|-----------|---------------------|
//! | `Batch::entries` | `batch`   | required            |
//! | `Entry::id`      | `id`      | required            |
//! | `Entry::context` | `context` | defaults to `""`    |
//! | `Entry::source`  | `source`  | required            |
//! | `Entry::target`  | `target`  | defaults to `""`    |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::core::errors::{Result, TranslationError};

/// Wire key of the entry array inside a batch object
pub const BATCH_KEY: &str = "batch";

/// Wire keys of an entry object
pub const ENTRY_KEYS: [&str; 4] = ["id", "context", "source", "target"];

/// One translatable UI string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique key used in application code
    pub id: String,
    /// Short note explaining where the string is shown
    #[serde(default)]
    pub context: String,
    /// Text in the source locale
    pub source: String,
    /// Text in the target locale, empty until translated
    #[serde(default)]
    pub target: String,
}

impl Entry {
    /// Create an untranslated entry without context
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context: String::new(),
            source: source.into(),
            target: String::new(),
        }
    }

    /// Attach a context hint
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Set the translated text
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// True once the target holds non-blank text
    pub fn is_translated(&self) -> bool {
        !self.target.trim().is_empty()
    }

    /// Copy of this entry with the target cleared, as sent to the model
    pub fn pending(&self) -> Self {
        Self {
            target: String::new(),
            ..self.clone()
        }
    }
}

/// Ordered collection of entries submitted in one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    /// Entries in submission order
    #[serde(rename = "batch")]
    pub entries: Vec<Entry>,
}

impl Batch {
    /// Batch holding `entries` in the given order
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Append an entry
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in batch order
    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Ids in batch order
    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.id.as_str()).collect()
    }

    /// Ids of entries whose target is still blank
    pub fn untranslated_ids(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| !e.is_translated())
            .map(|e| e.id.as_str())
            .collect()
    }

    /// Check the constraints a batch must meet before it is sent:
    /// at least one entry, non-empty unique ids, non-empty sources.
    pub fn validate_for_submission(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(TranslationError::invalid_batch("batch contains no entries"));
        }

        let mut seen = HashSet::new();
        for (index, entry) in self.entries.iter().enumerate() {
            if entry.id.trim().is_empty() {
                return Err(TranslationError::invalid_batch(format!(
                    "entry #{} has an empty id",
                    index
                )));
            }
            if entry.source.trim().is_empty() {
                return Err(TranslationError::invalid_batch(format!(
                    "entry '{}' has an empty source",
                    entry.id
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(TranslationError::invalid_batch(format!(
                    "duplicate id '{}'",
                    entry.id
                )));
            }
        }

        Ok(())
    }
}

impl From<Vec<Entry>> for Batch {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}

impl IntoIterator for Batch {
    type Item = Entry;
    type IntoIter = std::vec::IntoIter<Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Completion provider selected by the model identifier prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    /// Local LM Studio server (`lm_studio/...`)
    LmStudio,
    /// Local Ollama server through its OpenAI-compatible API (`ollama/...`)
    Ollama,
    /// OpenAI or any compatible endpoint (`openai/...` or no prefix)
    OpenAi,
}

impl Provider {
    /// Environment variable naming the base URL for this provider
    pub fn base_url_var(&self) -> &'static str {
        match self {
            Provider::LmStudio => "LM_STUDIO_API_BASE",
            Provider::Ollama => "OLLAMA_API_BASE",
            Provider::OpenAi => "OPENAI_API_BASE",
        }
    }

    /// Environment variable holding the API key, if the provider takes one
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Provider::LmStudio => Some("LM_STUDIO_API_KEY"),
            Provider::Ollama => None,
            Provider::OpenAi => Some("OPENAI_API_KEY"),
        }
    }

    /// Base URL used when the environment does not name one
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::LmStudio => "http://localhost:1234/v1",
            Provider::Ollama => "http://localhost:11434/v1",
            Provider::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Whether requests fail without a key
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Provider::OpenAi)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::LmStudio => write!(f, "lm_studio"),
            Provider::Ollama => write!(f, "ollama"),
            Provider::OpenAi => write!(f, "openai"),
        }
    }
}

/// A model identifier split into provider and bare model name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    /// Provider picked from the prefix
    pub provider: Provider,
    /// Model name as the server knows it
    pub name: String,
}

impl ModelRef {
    /// Split `provider/model`. Unknown prefixes are kept as part of the name
    /// (e.g. `meta-llama/Llama-3-8B` on an OpenAI-compatible server).
    pub fn parse(model: &str) -> Self {
        let model = model.trim();
        if let Some((prefix, rest)) = model.split_once('/') {
            let provider = match prefix {
                "lm_studio" => Some(Provider::LmStudio),
                "ollama" => Some(Provider::Ollama),
                "openai" => Some(Provider::OpenAi),
                _ => None,
            };
            if let Some(provider) = provider {
                return Self {
                    provider,
                    name: rest.to_string(),
                };
            }
        }

        Self {
            provider: Provider::OpenAi,
            name: model.to_string(),
        }
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    fn sample() -> Batch {
        Batch::new(vec![
            Entry::new("title", "Confirm").with_context("Title of the confirm action"),
            Entry::new("cancel", "Cancel").with_context("Label on the cancel button"),
        ])
    }

    #[test]
    fn test_entry_missing_optional_fields_default_to_empty() {
        let entry: Entry = serde_json::from_str(r#"{"id":"ok","source":"OK"}"#).unwrap();
        assert_eq!(entry.context, "");
        assert_eq!(entry.target, "");
        assert!(!entry.is_translated());
    }

    #[test]
    fn test_entry_missing_required_field_fails() {
        assert!(serde_json::from_str::<Entry>(r#"{"id":"ok","target":"Vale"}"#).is_err());
        assert!(serde_json::from_str::<Entry>(r#"{"source":"OK"}"#).is_err());
    }

    #[test]
    fn test_entry_wrong_type_fails() {
        assert!(serde_json::from_str::<Entry>(r#"{"id":7,"source":"OK"}"#).is_err());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let batch: Batch = serde_json::from_str(
            r#"{"batch":[{"id":"ok","source":"OK","target":"Vale","notes":"x"}],"model":"m"}"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.entries[0].target, "Vale");
    }

    #[test]
    fn test_batch_round_trip() {
        let mut batch = sample();
        batch.entries[1].target = "Cancelar".to_string();

        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.starts_with(r#"{"batch":["#));

        let parsed: Batch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, batch);
    }

    #[test]
    fn test_untranslated_ids() {
        let mut batch = sample();
        batch.entries[0].target = "Confirmar".to_string();
        batch.entries[1].target = "   ".to_string();

        assert_eq!(batch.untranslated_ids(), vec!["cancel"]);
        assert_eq!(batch.ids(), vec!["title", "cancel"]);
    }

    #[test]
    fn test_pending_clears_target() {
        let entry = Entry::new("ok", "OK").with_context("Button").with_target("Vale");
        let pending = entry.pending();
        assert_eq!(pending.target, "");
        assert_eq!(pending.context, "Button");
        assert_eq!(entry.target, "Vale");
    }

    #[test]
    fn test_validate_for_submission() {
        assert!(sample().validate_for_submission().is_ok());

        let err = Batch::default().validate_for_submission().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let empty_id = Batch::new(vec![Entry::new("", "OK")]);
        assert!(empty_id.validate_for_submission().is_err());

        let empty_source = Batch::new(vec![Entry::new("ok", " ")]);
        assert!(empty_source.validate_for_submission().is_err());

        let duplicate = Batch::new(vec![Entry::new("ok", "OK"), Entry::new("ok", "Okay")]);
        let err = duplicate.validate_for_submission().unwrap_err();
        assert!(err.to_string().contains("duplicate id 'ok'"));
    }

    #[test]
    fn test_model_ref_parse() {
        let model = ModelRef::parse("lm_studio/llama-3-8b-instruct");
        assert_eq!(model.provider, Provider::LmStudio);
        assert_eq!(model.name, "llama-3-8b-instruct");
        assert_eq!(model.to_string(), "lm_studio/llama-3-8b-instruct");

        let model = ModelRef::parse("ollama/qwen2.5:7b");
        assert_eq!(model.provider, Provider::Ollama);
        assert_eq!(model.name, "qwen2.5:7b");

        let model = ModelRef::parse("gpt-4o-mini");
        assert_eq!(model.provider, Provider::OpenAi);
        assert_eq!(model.name, "gpt-4o-mini");

        let model = ModelRef::parse("meta-llama/Llama-3-8B");
        assert_eq!(model.provider, Provider::OpenAi);
        assert_eq!(model.name, "meta-llama/Llama-3-8B");
    }

    #[test]
    fn test_provider_env_vars() {
        assert_eq!(Provider::LmStudio.base_url_var(), "LM_STUDIO_API_BASE");
        assert_eq!(Provider::Ollama.api_key_var(), None);
        assert!(Provider::OpenAi.requires_api_key());
        assert!(!Provider::LmStudio.requires_api_key());
    }
}
