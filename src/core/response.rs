//! Parsing and validation of model replies

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::models::{Batch, Entry, BATCH_KEY, ENTRY_KEYS};

/// How forgiving the reply parser is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseMode {
    /// Ignore unknown keys, unwrap ```json fences, accept a bare entry array
    #[default]
    Lenient,
    /// Exactly `{"batch": [...]}` with only the known entry keys
    Strict,
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$")
            .expect("fence pattern is valid")
    })
}

/// Remove a surrounding markdown code fence, if any
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match fence_regex().captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

/// Parse a model reply into a [`Batch`]
pub fn parse_batch(raw: &str, mode: ParseMode) -> Result<Batch> {
    let text = match mode {
        ParseMode::Lenient => strip_code_fence(raw),
        ParseMode::Strict => raw.trim(),
    };

    if text.is_empty() {
        return Err(TranslationError::malformed("response is empty"));
    }

    let value: Value = serde_json::from_str(text)
        .map_err(|e| TranslationError::malformed(format!("response is not valid JSON: {}", e)))?;

    let value = match (mode, value) {
        (_, Value::Object(map)) => Value::Object(map),
        (ParseMode::Lenient, Value::Array(items)) => {
            debug!("Reply is a bare entry array; wrapping it in a batch object");
            let mut map = serde_json::Map::new();
            map.insert(BATCH_KEY.to_string(), Value::Array(items));
            Value::Object(map)
        }
        (_, other) => {
            return Err(TranslationError::malformed(format!(
                "expected a JSON object with a '{}' array, got {}",
                BATCH_KEY,
                json_type_name(&other)
            )))
        }
    };

    if mode == ParseMode::Strict {
        reject_unknown_keys(&value)?;
    }

    serde_json::from_value(value).map_err(|e| {
        TranslationError::malformed(format!("response does not match the batch schema: {}", e))
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn reject_unknown_keys(value: &Value) -> Result<()> {
    let Some(map) = value.as_object() else {
        return Ok(());
    };

    if let Some(key) = map.keys().find(|k| k.as_str() != BATCH_KEY) {
        return Err(TranslationError::malformed(format!(
            "unknown key '{}' in batch object",
            key
        )));
    }

    if let Some(Value::Array(items)) = map.get(BATCH_KEY) {
        for (index, item) in items.iter().enumerate() {
            if let Some(entry) = item.as_object() {
                if let Some(key) = entry.keys().find(|k| !ENTRY_KEYS.contains(&k.as_str())) {
                    return Err(TranslationError::malformed(format!(
                        "unknown key '{}' in entry #{}",
                        key, index
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Check that `returned` holds every submitted id exactly once and nothing
/// else, and return its entries in submission order.
pub fn align_to(submitted: &Batch, returned: Batch) -> Result<Batch> {
    let mut by_id: HashMap<String, Entry> = HashMap::with_capacity(returned.len());
    let mut duplicated = Vec::new();

    for entry in returned {
        if by_id.contains_key(&entry.id) {
            if !duplicated.contains(&entry.id) {
                duplicated.push(entry.id.clone());
            }
            continue;
        }
        by_id.insert(entry.id.clone(), entry);
    }

    let mut aligned = Vec::with_capacity(submitted.len());
    let mut missing = Vec::new();

    for original in submitted {
        match by_id.remove(&original.id) {
            Some(entry) => {
                if entry.source != original.source {
                    warn!(
                        "Model altered the source of '{}': {:?} -> {:?}",
                        original.id, original.source, entry.source
                    );
                }
                aligned.push(entry);
            }
            None => missing.push(original.id.clone()),
        }
    }

    let mut unexpected: Vec<String> = by_id.into_keys().collect();
    unexpected.sort();

    if !missing.is_empty() || !unexpected.is_empty() || !duplicated.is_empty() {
        return Err(TranslationError::MisalignedResponse {
            missing,
            unexpected,
            duplicated,
        });
    }

    Ok(Batch::new(aligned))
}
