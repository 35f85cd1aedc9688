//! Handover command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::handover::HandoverPipeline;
use anyhow::Result;

/// Run the handover command.
pub async fn run_handover(dir: &str, force: bool, settings: Settings) -> Result<()> {
    let dir = Settings::expand_path(dir);
    if !dir.is_dir() {
        Output::error(&format!("Not a directory: {}", dir.display()));
        return Err(anyhow::anyhow!("Not a directory: {}", dir.display()));
    }

    if let Err(e) = preflight::check(Operation::Transcribe) {
        Output::error(&format!("{}", e));
        Output::info("Run 'debrief doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Output::header("Project Handover");
    Output::kv("Videos", &dir.display().to_string());
    Output::kv("Output", &settings.output_dir().display().to_string());
    if force {
        Output::info("Force mode: every video is reprocessed");
    }

    let outcome = HandoverPipeline::new(&settings)?.generate(&dir, force).await?;
    let report = &outcome.report;

    Output::header("Recordings");
    for video in &report.videos {
        let date = video.date.map(|d| d.format("%Y-%m-%d").to_string());
        Output::video_line(
            &video.name,
            date.as_deref(),
            video.duration_seconds,
            video.error.as_deref(),
        );
    }

    let failed = report.videos.len() - report.successful_videos().count();
    if failed > 0 {
        Output::warning(&format!("{} recording(s) could not be processed", failed));
    }
    if outcome.analysis_cached {
        Output::info("Project analysis reused from cache (use --force to regenerate)");
    }

    Output::header("Report");
    Output::kv("People", &report.context.people.len().to_string());
    Output::kv("Components", &report.context.components.len().to_string());
    Output::kv("Timeline events", &report.context.timeline.len().to_string());
    Output::kv("Diagrams", &report.diagrams.len().to_string());
    Output::success(&format!("HTML report: {}", outcome.html_path.display()));
    for file in &outcome.markdown_files {
        Output::list_item(&file.display().to_string());
    }

    Ok(())
}
