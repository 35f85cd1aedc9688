//! Directory of recordings → handover report.

use super::analyzer::HandoverAnalyzer;
use super::diagrams;
use super::discovery::{discover_videos, extract_date};
use super::models::{HandoverReport, ProjectContext, VideoSummary};
use super::render::{export_markdown, write_html};
use crate::cache::stem;
use crate::config::{HandoverSettings, Settings};
use crate::error::{DebriefError, Result};
use crate::pipeline::{default_summarizer, Pipeline};
use crate::transcription::WhisperTranscriber;
use chrono::{DateTime, Local};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const ANALYSIS_CACHE_FILE: &str = ".handover_cache.json";

/// Cross-video results, reused while the set of summaries is unchanged.
#[derive(Debug, Serialize, Deserialize)]
struct AnalysisCache {
    cache_key: String,
    generated_at: DateTime<Local>,
    synthesis: String,
    context: ProjectContext,
    executive_summary: String,
    technical_summary: String,
}

/// Where the report ended up.
#[derive(Debug)]
pub struct HandoverOutcome {
    pub report: HandoverReport,
    pub html_path: PathBuf,
    pub markdown_files: Vec<PathBuf>,
    /// True when the cross-video analysis was loaded from the cache.
    pub analysis_cached: bool,
}

/// Processes every recording in a directory and writes the handover report.
pub struct HandoverPipeline {
    pipeline: Pipeline,
    analyzer: HandoverAnalyzer,
    settings: HandoverSettings,
    output_dir: PathBuf,
    show_progress: bool,
}

impl HandoverPipeline {
    /// Build the OpenAI-backed pipeline. Per-video output is silenced in
    /// favour of a single progress bar.
    pub fn new(settings: &Settings) -> Result<Self> {
        let transcriber = WhisperTranscriber::from_settings(settings)?.quiet();
        let summarizer = default_summarizer(settings)?;
        let pipeline =
            Pipeline::with_components(settings, Arc::new(transcriber), Arc::new(summarizer))
                .quiet();
        Ok(Self::with_pipeline(settings, pipeline))
    }

    pub fn with_pipeline(settings: &Settings, pipeline: Pipeline) -> Self {
        let analyzer =
            HandoverAnalyzer::new(pipeline.summarizer().clone(), settings.handover.clone());
        Self {
            pipeline,
            analyzer,
            settings: settings.handover.clone(),
            output_dir: settings.output_dir(),
            show_progress: true,
        }
    }

    /// Hide the progress bar.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Generate the report for every video in `dir`.
    ///
    /// Individual videos may fail; the run fails only when none succeeds.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn generate(&self, dir: &Path, force: bool) -> Result<HandoverOutcome> {
        let paths = discover_videos(dir)?;
        if paths.is_empty() {
            return Err(DebriefError::Handover(format!(
                "No video files found in {}",
                dir.display()
            )));
        }
        info!("Found {} videos", paths.len());

        let videos = self.process_videos(&paths, force).await;
        let ok = videos.iter().filter(|v| v.is_ok()).count();
        info!("Processed {}/{} videos", ok, videos.len());
        if ok == 0 {
            return Err(DebriefError::Handover(
                "No videos were processed successfully".into(),
            ));
        }

        let cache_path = self.output_dir.join(ANALYSIS_CACHE_FILE);
        let cache_key = cache_key(&videos);

        let (cache, analysis_cached) = match self.load_cache(&cache_path, &cache_key, force) {
            Some(cache) => {
                info!("Using cached handover analysis");
                (cache, true)
            }
            None => {
                let cache = self.analyze(&videos, cache_key).await?;
                if let Err(e) = save_cache(&cache_path, &cache) {
                    warn!("Could not save handover cache: {}", e);
                }
                (cache, false)
            }
        };

        let report = HandoverReport {
            video_directory: dir.to_path_buf(),
            generated_at: Local::now(),
            diagrams: diagrams::generate_all(&cache.context, &videos),
            videos,
            synthesis: cache.synthesis,
            context: cache.context,
            executive_summary: cache.executive_summary,
            technical_summary: cache.technical_summary,
        };

        let html_path = self.output_dir.join(&self.settings.report_file);
        write_html(&report, &html_path)?;
        let markdown_files =
            export_markdown(&report, &self.output_dir.join(&self.settings.markdown_dir))?;
        info!("Handover report written to {}", html_path.display());

        Ok(HandoverOutcome {
            report,
            html_path,
            markdown_files,
            analysis_cached,
        })
    }

    /// Run the single-video pipeline over `paths`, at most
    /// `max_parallel_videos` at a time. Output order follows `paths`.
    async fn process_videos(&self, paths: &[PathBuf], force: bool) -> Vec<VideoSummary> {
        let pb = self.progress_bar(paths.len());
        let mut slots: Vec<Option<VideoSummary>> = vec![None; paths.len()];

        let mut results = stream::iter(paths.iter().enumerate())
            .map(|(idx, path)| async move {
                (idx, summarize_video(&self.pipeline, path, force).await)
            })
            .buffer_unordered(self.settings.max_parallel_videos.max(1));

        while let Some((idx, video)) = results.next().await {
            match &video.error {
                Some(e) => pb.println(format!("  ✗ {}: {}", video.name, e)),
                None => pb.println(format!("  ✓ {}", video.name)),
            }
            pb.inc(1);
            slots[idx] = Some(video);
        }
        pb.finish_and_clear();

        slots.into_iter().flatten().collect()
    }

    async fn analyze(&self, videos: &[VideoSummary], cache_key: String) -> Result<AnalysisCache> {
        let labeled: Vec<String> = videos
            .iter()
            .filter(|v| v.is_ok())
            .map(|v| format!("{} ({})\n{}", v.name, v.date_label("undated"), v.summary))
            .collect();

        info!("Synthesizing {} meeting summaries", labeled.len());
        let synthesis = self.pipeline.summarizer().summarize_many(&labeled).await?;

        info!("Extracting project context");
        let context = self.analyzer.analyze(videos, &synthesis.text).await?;

        let (executive, technical) = tokio::join!(
            self.analyzer.executive_summary(&context),
            self.analyzer.technical_summary(&context),
        );

        Ok(AnalysisCache {
            cache_key,
            generated_at: Local::now(),
            synthesis: synthesis.text,
            context,
            executive_summary: executive?,
            technical_summary: technical?,
        })
    }

    fn load_cache(&self, path: &Path, key: &str, force: bool) -> Option<AnalysisCache> {
        if force || !path.exists() {
            return None;
        }
        let cache: AnalysisCache = match std::fs::read_to_string(path)
            .map_err(DebriefError::from)
            .and_then(|s| serde_json::from_str(&s).map_err(DebriefError::from))
        {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Ignoring unreadable handover cache: {}", e);
                return None;
            }
        };
        (cache.cache_key == key).then_some(cache)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("  {spinner:.green} Videos    [{bar:30.cyan/blue}] {pos}/{len} {elapsed}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }
}

async fn summarize_video(pipeline: &Pipeline, path: &Path, force: bool) -> VideoSummary {
    let name = stem(path).unwrap_or_else(|_| path.display().to_string());
    let date = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(extract_date);

    match pipeline.process(path, force).await {
        Ok(result) => VideoSummary {
            name,
            source: path.to_path_buf(),
            date,
            summary: result.summary,
            duration_seconds: Some(result.transcript.duration_seconds)
                .filter(|d| *d > 0.0),
            error: None,
        },
        Err(e) => {
            warn!("Failed to process {}: {}", path.display(), e);
            VideoSummary {
                name,
                source: path.to_path_buf(),
                date,
                summary: String::new(),
                duration_seconds: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Fingerprint of the successful summaries: file name and summary length.
fn cache_key(videos: &[VideoSummary]) -> String {
    let mut parts: Vec<String> = videos
        .iter()
        .filter(|v| v.is_ok())
        .map(|v| {
            let file_name = v
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| v.name.clone());
            format!("{}:{}", file_name, v.summary.chars().count())
        })
        .collect();
    parts.sort();

    Sha256::digest(parts.join("|").as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn save_cache(path: &Path, cache: &AnalysisCache) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(cache)?)?;
    Ok(())
}
