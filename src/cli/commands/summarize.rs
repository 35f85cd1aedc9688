//! Summarize command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::pipeline::{is_text_input, Pipeline};
use crate::summarize::SummaryMode;
use anyhow::Result;

/// Run the summarize command.
pub async fn run_summarize(input: &str, force: bool, print: bool, settings: Settings) -> Result<()> {
    let path = Settings::expand_path(input);
    if !path.exists() {
        Output::error(&format!("File not found: {}", path.display()));
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let operation = if is_text_input(&path) {
        Operation::Summarize
    } else {
        Operation::Transcribe
    };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'debrief doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::info(&format!("Processing: {}", path.display()));
    let pipeline = Pipeline::new(&settings)?;
    let result = pipeline.process(&path, force).await?;

    if let Some(details) = &result.details {
        let route = match details.mode {
            SummaryMode::Flat => "single pass".to_string(),
            _ if details.group_count > 0 => {
                format!("{} chunks, {} groups", details.chunk_count, details.group_count)
            }
            _ => format!("{} chunks", details.chunk_count),
        };
        Output::kv("Model", pipeline.summarizer().model());
        Output::kv("Output", &pipeline.cache().dir().display().to_string());
        Output::kv("Route", &route);
        if details.failed_parts > 0 {
            Output::warning(&format!(
                "{} part(s) could not be summarized and are marked in the report",
                details.failed_parts
            ));
        }
        if details.fallback_used {
            Output::warning("Final consolidation failed; the summary is a concatenation of parts");
        }
    }

    Output::success(&format!("Summary saved to {}", result.summary_path.display()));

    if print {
        println!("\n{}", result.summary);
    }

    Ok(())
}
