//! CLI options and the translate handler

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::core::backend::CompletionBackend;
use crate::core::client::Translator;
use crate::core::config::{
    EndpointConfig, TranslatorConfig, DEFAULT_SOURCE_LOCALE, DEFAULT_TARGET_LOCALE,
};
use crate::core::errors::{Result, TranslationError};
use crate::core::models::Batch;
use crate::core::prompt::build_prompt;
use crate::core::response::ParseMode;

/// Options for a translation run; each overrides its environment variable
#[derive(Args, Debug, Clone, Default)]
pub struct TranslateArgs {
    /// Model identifier, e.g. lm_studio/llama-3-8b-instruct (env: LOCALE_TRANSLATOR_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the completion API (env: LM_STUDIO_API_BASE, OLLAMA_API_BASE, OPENAI_API_BASE)
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key for the completion endpoint
    #[arg(long)]
    pub api_key: Option<String>,

    /// Source locale (env: SOURCE_LOCALE, default: en-US)
    #[arg(long)]
    pub source_locale: Option<String>,

    /// Target locale (env: TARGET_LOCALE, default: es-MX)
    #[arg(short, long)]
    pub target_locale: Option<String>,

    /// Request timeout in milliseconds (env: REQUEST_TIMEOUT_MS)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Reject replies with unknown keys, code fences or a bare array
    #[arg(long)]
    pub strict: bool,

    /// Accept replies whose ids do not match the submitted ids
    #[arg(long)]
    pub no_verify_ids: bool,

    /// Print the prompt and exit without calling the model
    #[arg(long)]
    pub print_prompt: bool,
}

/// Everything a run needs, after CLI overrides and environment lookup
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model, preamble and parsing options
    pub translator: TranslatorConfig,
    /// Where the completion request goes
    pub endpoint: EndpointConfig,
    /// Locale of the source texts
    pub source_locale: String,
    /// Locale translated into
    pub target_locale: String,
}

/// Merge CLI options over variables from `env`
pub fn resolve_settings<F>(args: &TranslateArgs, env: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| {
        let cli = match key {
            "LOCALE_TRANSLATOR_MODEL" => args.model.clone(),
            "SOURCE_LOCALE" => args.source_locale.clone(),
            "TARGET_LOCALE" => args.target_locale.clone(),
            "REQUEST_TIMEOUT_MS" => args.timeout_ms.map(|ms| ms.to_string()),
            _ => None,
        };
        cli.or_else(|| env(key))
    };

    let mut translator = TranslatorConfig::from_vars(&lookup)?;
    translator.temperature = args.temperature;
    translator.verify_alignment = !args.no_verify_ids;
    if args.strict {
        translator.parse_mode = ParseMode::Strict;
    }

    let mut endpoint = EndpointConfig::from_vars(translator.model_ref().provider, &lookup)?;
    if let Some(api_base) = &args.api_base {
        endpoint.api_base = api_base.clone();
    }
    if let Some(api_key) = &args.api_key {
        endpoint.api_key = Some(api_key.clone());
    }

    Ok(Settings {
        translator,
        endpoint,
        source_locale: lookup("SOURCE_LOCALE").unwrap_or_else(|| DEFAULT_SOURCE_LOCALE.to_string()),
        target_locale: lookup("TARGET_LOCALE").unwrap_or_else(|| DEFAULT_TARGET_LOCALE.to_string()),
    })
}

/// Success report: banner, the batch as JSON, then one block per entry
pub fn format_report(batch: &Batch, source_locale: &str, target_locale: &str) -> anyhow::Result<String> {
    let width = source_locale.len().max(target_locale.len()).max("context".len());
    let mut out = String::new();

    writeln!(out, "✅ Translation batch completed!\n")?;
    writeln!(out, "{}\n", serde_json::to_string_pretty(batch)?)?;

    for entry in batch {
        writeln!(out, "{:<width$} : {}", "id", entry.id, width = width)?;
        writeln!(out, "{:<width$} : {}", "context", entry.context, width = width)?;
        writeln!(out, "{:<width$} : {}", source_locale, entry.source, width = width)?;
        writeln!(out, "{:<width$} : {}", target_locale, entry.target, width = width)?;
        writeln!(out, "---")?;
    }

    Ok(out)
}

async fn run_translation(translator: &Translator, settings: &Settings, batch: Batch) -> Result<Batch> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!(
        "Translating {} entries into {} with {}",
        batch.len(),
        settings.target_locale,
        settings.translator.model
    ));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = translator.translate(batch).await;
    spinner.finish_and_clear();

    result
}

/// Log a failed run and tell the user on stderr
pub fn report_failure(e: &TranslationError) {
    error!(kind = %e.kind(), "Translation failed: {}", e);
    eprintln!("❌ Translation failed: {}", e);
}

/// Process exit status for a run
pub fn exit_status(succeeded: bool, fail_on_error: bool) -> u8 {
    if !succeeded && fail_on_error {
        1
    } else {
        0
    }
}

/// Write the prompt for `batch` to `out` without calling the model
pub fn print_prompt<W: Write>(settings: &Settings, batch: &Batch, out: &mut W) -> anyhow::Result<bool> {
    let prompt = settings
        .translator
        .validate()
        .and_then(|_| build_prompt(&settings.translator.preamble, batch));

    match prompt {
        Ok(prompt) => {
            writeln!(out, "{}", prompt)?;
            Ok(true)
        }
        Err(e) => {
            report_failure(&e);
            Ok(false)
        }
    }
}

/// Translate `batch` through `backend` and write the report to `out`.
///
/// Translation failures of any kind are logged and printed to stderr here
/// and never propagate; nothing is written to `out` for a failed run. The
/// return value tells whether the run succeeded.
pub async fn handle_translate<W: Write>(
    settings: &Settings,
    batch: Batch,
    backend: Arc<dyn CompletionBackend>,
    out: &mut W,
) -> anyhow::Result<bool> {
    info!("Endpoint: {}", settings.endpoint.api_base);
    info!("Source locale: {}", settings.source_locale);
    info!("Target locale: {}", settings.target_locale);

    let result = match Translator::new(settings.translator.clone(), backend) {
        Ok(translator) => run_translation(&translator, settings, batch).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(translated) => {
            write!(
                out,
                "{}",
                format_report(&translated, &settings.source_locale, &settings.target_locale)?
            )?;
            Ok(true)
        }
        Err(e) => {
            report_failure(&e);
            Ok(false)
        }
    }
}
