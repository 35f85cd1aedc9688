//! Debrief CLI entry point.

use anyhow::Result;
use clap::Parser;
use debrief::cli::{commands, Cli, Commands};
use debrief::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };
    cli.apply_overrides(&mut settings);

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level);
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("debrief={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_deref())?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }

        Commands::Prompts { action } => {
            commands::run_prompts(action, &settings)?;
        }

        Commands::Summarize { input, force, print } => {
            prepare(&settings)?;
            commands::run_summarize(input, *force, *print, settings).await?;
        }

        Commands::Transcribe {
            input,
            output,
            format,
        } => {
            prepare(&settings)?;
            commands::run_transcribe(input, output.clone(), format, settings).await?;
        }

        Commands::Handover { dir, force } => {
            prepare(&settings)?;
            commands::run_handover(dir, *force, settings).await?;
        }
    }

    Ok(())
}

/// Validate settings and create working directories.
fn prepare(settings: &Settings) -> Result<()> {
    settings.validate()?;
    std::fs::create_dir_all(settings.output_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;
    Ok(())
}
