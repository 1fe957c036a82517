//! Batch translator: prompt, complete, parse, align

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::core::backend::{
    ChatMessage, CompletionBackend, CompletionRequest, JsonSchemaFormat, ResponseFormat,
};
use crate::core::config::TranslatorConfig;
use crate::core::errors::Result;
use crate::core::models::Batch;
use crate::core::prompt::{batch_schema, build_prompt};
use crate::core::response::{align_to, parse_batch};

/// Translates a [`Batch`] with one completion call
#[derive(Clone)]
pub struct Translator {
    config: Arc<TranslatorConfig>,
    backend: Arc<dyn CompletionBackend>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("config", &self.config)
            .field("backend", &self.backend.backend_name())
            .finish()
    }
}

impl Translator {
    /// Create a translator over any completion backend
    pub fn new(config: TranslatorConfig, backend: Arc<dyn CompletionBackend>) -> Result<Self> {
        config.validate()?;

        if !config.verify_alignment {
            warn!("Id alignment check disabled; model output is trusted as-is");
        }

        Ok(Self {
            config: Arc::new(config),
            backend,
        })
    }

    /// Configuration this translator was built with
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Prompt that [`Translator::translate`] would send for `batch`
    pub fn build_prompt(&self, batch: &Batch) -> Result<String> {
        build_prompt(&self.config.preamble, batch)
    }

    /// Completion request that [`Translator::translate`] would send for `batch`
    pub fn build_request(&self, batch: &Batch) -> Result<CompletionRequest> {
        let prompt = self.build_prompt(batch)?;

        Ok(CompletionRequest {
            model: self.config.model_ref().name,
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.config.temperature,
            response_format: Some(ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: "Batch".to_string(),
                    schema: batch_schema(),
                    strict: true,
                },
            }),
        })
    }

    /// Translate every entry of `batch` and return the filled-in batch.
    ///
    /// The input is consumed and a new batch is built from the model reply.
    /// With `verify_alignment` on, the result holds exactly the submitted ids
    /// in submission order.
    pub async fn translate(&self, batch: Batch) -> Result<Batch> {
        batch.validate_for_submission()?;

        let request = self.build_request(&batch)?;
        info!(
            "Translating {} entries with {} via {}",
            batch.len(),
            self.config.model,
            self.backend.backend_name()
        );

        let started = Instant::now();
        let raw = self.backend.complete(&request).await?;
        debug!("Raw reply ({} bytes): {}", raw.len(), raw);

        let parsed = parse_batch(&raw, self.config.parse_mode)?;

        let translated = if self.config.verify_alignment {
            align_to(&batch, parsed)?
        } else {
            if parsed.len() != batch.len() {
                warn!(
                    "Reply holds {} entries for {} submitted",
                    parsed.len(),
                    batch.len()
                );
            }
            parsed
        };

        let untranslated = translated.untranslated_ids();
        if !untranslated.is_empty() {
            warn!("Entries left without a translation: {}", untranslated.join(", "));
        }

        info!(
            "Translation batch completed: {} entries in {:?}",
            translated.len(),
            started.elapsed()
        );

        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{ErrorKind, TranslationError};
    use crate::core::mock::MockCompletion;
    use crate::core::models::Entry;
    use crate::core::response::ParseMode;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let value = tracing::subscriber::with_default(subscriber, f);
        (value, buffer.contents())
    }

    const CANCEL_REPLY: &str = r#"{"batch":[{"id":"cancel","context":"Label on the cancel button","source":"Cancel","target":"Cancelar"}]}"#;

    fn cancel_batch() -> Batch {
        Batch::new(vec![
            Entry::new("cancel", "Cancel").with_context("Label on the cancel button")
        ])
    }

    fn translator(mock: &Arc<MockCompletion>) -> Translator {
        Translator::new(TranslatorConfig::default(), mock.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_translate_cancel_button() {
        let reply = Batch::new(vec![Entry::new("cancel", "Cancel")
            .with_context("Label on the cancel button")
            .with_target("Cancelar")]);
        let mock = Arc::new(MockCompletion::replying_with_batch(&reply).unwrap());
        let result = translator(&mock).translate(cancel_batch()).await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.entries[0].id, "cancel");
        assert_eq!(result.entries[0].target, "Cancelar");
    }

    #[tokio::test]
    async fn test_translate_sends_single_user_message() {
        let mock = Arc::new(MockCompletion::replying(CANCEL_REPLY));
        translator(&mock).translate(cancel_batch()).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);

        let request = &requests[0];
        assert_eq!(request.model, "llama-3-8b-instruct");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert!(request.messages[0].content.contains("Mexican Spanish"));
        assert!(request.messages[0]
            .content
            .contains(r#"- id: cancel, context: Label on the cancel button, source: Cancel, target: """#));
        assert!(matches!(
            request.response_format,
            Some(ResponseFormat::JsonSchema { .. })
        ));
    }

    #[tokio::test]
    async fn test_translate_not_json() {
        let mock = Arc::new(MockCompletion::replying("not json"));
        let err = translator(&mock).translate(cancel_batch()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_translate_transport_failure() {
        let mock = Arc::new(MockCompletion::failing("connection refused"));
        let err = translator(&mock).translate(cancel_batch()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_translate_rejects_invalid_batch_before_sending() {
        let mock = Arc::new(MockCompletion::replying(CANCEL_REPLY));
        let err = translator(&mock).translate(Batch::default()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_translate_rejects_misaligned_reply() {
        let reply = r#"{"batch":[{"id":"ok","source":"OK","target":"Vale"}]}"#;
        let mock = Arc::new(MockCompletion::replying(reply));
        let err = translator(&mock).translate(cancel_batch()).await.unwrap_err();

        assert!(matches!(err, TranslationError::MisalignedResponse { .. }));
    }

    #[tokio::test]
    async fn test_translate_without_alignment_trusts_reply() {
        let reply = r#"{"batch":[{"id":"ok","source":"OK","target":"Vale"}]}"#;
        let mock = Arc::new(MockCompletion::replying(reply));
        let config = TranslatorConfig {
            verify_alignment: false,
            ..Default::default()
        };
        let translator = Translator::new(config, mock.clone()).unwrap();

        let result = translator.translate(cancel_batch()).await.unwrap();
        assert_eq!(result.ids(), vec!["ok"]);
    }

    #[tokio::test]
    async fn test_translate_strict_mode_rejects_fenced_reply() {
        let reply = format!("```json\n{}\n```", CANCEL_REPLY);
        let mock = Arc::new(MockCompletion::replying(reply));

        assert!(translator(&mock).translate(cancel_batch()).await.is_ok());

        let config = TranslatorConfig {
            parse_mode: ParseMode::Strict,
            ..Default::default()
        };
        let strict = Translator::new(config, mock.clone()).unwrap();
        let err = strict.translate(cancel_batch()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_translate_keeps_untranslated_entries_distinguishable() {
        let batch = Batch::new(vec![
            Entry::new("title", "Confirm"),
            Entry::new("cancel", "Cancel"),
        ]);
        let reply = r#"{"batch":[{"id":"cancel","source":"Cancel","target":"Cancelar"},{"id":"title","source":"Confirm","target":""}]}"#;
        let mock = Arc::new(MockCompletion::replying(reply));

        let result = translator(&mock).translate(batch).await.unwrap();
        assert_eq!(result.ids(), vec!["title", "cancel"]);
        assert_eq!(result.untranslated_ids(), vec!["title"]);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mock = Arc::new(MockCompletion::replying(CANCEL_REPLY));
        let err = Translator::new(TranslatorConfig::new("", "Translate."), mock).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_alignment_warning_logged_once_at_construction() {
        let config = TranslatorConfig {
            verify_alignment: false,
            ..Default::default()
        };

        let (validated, logs) = capture_logs(|| config.validate());
        assert!(validated.is_ok());
        assert!(logs.is_empty());

        let mock = Arc::new(MockCompletion::replying(CANCEL_REPLY));
        let (built, logs) = capture_logs(|| Translator::new(config.clone(), mock));
        assert!(built.is_ok());
        assert_eq!(logs.matches("Id alignment check disabled").count(), 1);

        let mock = Arc::new(MockCompletion::replying(CANCEL_REPLY));
        let (_, logs) = capture_logs(|| Translator::new(TranslatorConfig::default(), mock));
        assert!(logs.is_empty());
    }
}
