//! Main entry point for the Locale Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use locale_translator::cli::commands::{
    exit_status, handle_translate, print_prompt, report_failure, resolve_settings, TranslateArgs,
};
use locale_translator::cli::samples::sample_batch;
use locale_translator::HttpCompletionBackend;

/// Locale Translator - translate UI strings with a local or hosted LLM
#[derive(Parser, Debug)]
#[command(name = "locale-translator", version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Exit with status 1 when the translation fails
    #[arg(long)]
    fail_on_error: bool,

    #[command(flatten)]
    translate: TranslateArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("locale_translator={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = match resolve_settings(&args.translate, |key| std::env::var(key).ok()) {
        Ok(settings) => settings,
        Err(e) => {
            report_failure(&e);
            return Ok(ExitCode::from(exit_status(false, args.fail_on_error)));
        }
    };

    let batch = sample_batch();
    let mut stdout = std::io::stdout();

    let succeeded = if args.translate.print_prompt {
        print_prompt(&settings, &batch, &mut stdout)?
    } else {
        match HttpCompletionBackend::new(settings.endpoint.clone()) {
            Ok(backend) => handle_translate(&settings, batch, Arc::new(backend), &mut stdout).await?,
            Err(e) => {
                report_failure(&e);
                false
            }
        }
    };

    Ok(ExitCode::from(exit_status(succeeded, args.fail_on_error)))
}
