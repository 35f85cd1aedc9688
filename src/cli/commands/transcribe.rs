//! Transcribe command implementation.

use crate::audio::is_media_file;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcription::{format_transcript, OutputFormat, Transcriber, WhisperTranscriber};
use anyhow::Result;

/// Run the transcribe command.
pub async fn run_transcribe(
    input: &str,
    output: Option<String>,
    format: &str,
    settings: Settings,
) -> Result<()> {
    let format: OutputFormat = format.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let path = Settings::expand_path(input);

    if !path.exists() {
        Output::error(&format!("File not found: {}", path.display()));
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }
    if !is_media_file(&path) {
        Output::warning("Unrecognized extension; trying anyway");
    }

    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        Output::info("Run 'debrief doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let transcriber = WhisperTranscriber::from_settings(&settings)?;
    let transcript = transcriber.transcribe(&path).await?;
    let rendered = format_transcript(&transcript, format)?;

    match output {
        Some(out) => {
            let out_path = Settings::expand_path(&out);
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&out_path, rendered)?;
            Output::success(&format!(
                "Transcript ({} segments) written to {}",
                transcript.segments.len(),
                out_path.display()
            ));
        }
        None => println!("{}", rendered),
    }

    Ok(())
}
