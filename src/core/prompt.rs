//! Prompt construction
//!
//! A prompt is the instruction preamble, the batch schema rendered as JSON,
//! and one line per entry showing its fields as written, with the target
//! left empty. Entry text is not escaped, so ids, contexts and sources
//! appear in the prompt exactly as submitted.

use serde_json::{json, Value};

use crate::core::errors::Result;
use crate::core::models::{Batch, Entry};

/// Heading placed before the entry lines
pub const ENTRIES_HEADING: &str = "Entries to translate:";

/// JSON schema describing a [`Batch`]
pub fn batch_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "batch": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "id": {
                            "type": "string",
                            "description": "Unique key used in the application code"
                        },
                        "context": {
                            "type": "string",
                            "description": "Short note that explains the purpose of this string (helps choose the right translation)"
                        },
                        "source": {
                            "type": "string",
                            "description": "Text in the source locale"
                        },
                        "target": {
                            "type": "string",
                            "description": "Translated text in the target locale"
                        }
                    },
                    "required": ["id", "context", "source", "target"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["batch"],
        "additionalProperties": false
    })
}

/// Schema as indented text for inclusion in the prompt
pub fn render_schema() -> Result<String> {
    Ok(serde_json::to_string_pretty(&batch_schema())?)
}

/// One entry line, target left empty
fn entry_line(entry: &Entry) -> String {
    format!(
        "- id: {}, context: {}, source: {}, target: \"\"",
        entry.id, entry.context, entry.source
    )
}

/// Build the complete prompt for one batch
pub fn build_prompt(preamble: &str, batch: &Batch) -> Result<String> {
    let mut prompt = String::new();
    prompt.push_str(preamble.trim_end());
    prompt.push_str("\n\n");
    prompt.push_str(&render_schema()?);
    prompt.push_str("\n\n");
    prompt.push_str(ENTRIES_HEADING);
    prompt.push('\n');

    for entry in batch {
        prompt.push_str(&entry_line(entry));
        prompt.push('\n');
    }

    Ok(prompt)
}
