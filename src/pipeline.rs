//! Single-file pipeline: transcribe, summarize, cache.

use crate::cache::{stem, ResultCache};
use crate::config::{Prompts, Settings};
use crate::error::{DebriefError, Result};
use crate::llm::{LlmClient, OpenAiLlm};
use crate::summarize::{FinalSummary, Summarizer};
use crate::transcription::{Transcriber, Transcript, WhisperTranscriber};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

/// Extensions treated as ready-made transcripts rather than media.
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Outcome of processing one input file.
#[derive(Debug, Clone, Serialize)]
pub struct VideoResult {
    pub source: PathBuf,
    /// File stem, used for artifact names and report headings.
    pub name: String,
    pub transcript: Transcript,
    pub summary: String,
    pub summary_path: PathBuf,
    pub transcript_cached: bool,
    pub summary_cached: bool,
    /// Engine bookkeeping; absent when the summary came from the cache.
    pub details: Option<FinalSummary>,
}

/// Transcribe → summarize → cache for a single file.
pub struct Pipeline {
    transcriber: Arc<dyn Transcriber>,
    summarizer: Arc<Summarizer>,
    cache: ResultCache,
    quiet: bool,
}

impl Pipeline {
    /// Build the default OpenAI-backed pipeline.
    pub fn new(settings: &Settings) -> Result<Self> {
        let summarizer = default_summarizer(settings)?;
        let transcriber = WhisperTranscriber::from_settings(settings)?;

        Ok(Self::with_components(
            settings,
            Arc::new(transcriber),
            Arc::new(summarizer),
        ))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: &Settings,
        transcriber: Arc<dyn Transcriber>,
        summarizer: Arc<Summarizer>,
    ) -> Self {
        Self {
            transcriber,
            summarizer,
            cache: ResultCache::new(settings.output_dir()),
            quiet: false,
        }
    }

    /// Suppress per-step progress lines.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    pub fn summarizer(&self) -> &Arc<Summarizer> {
        &self.summarizer
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    fn report(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }

    /// Process one file. With `force`, cached artifacts are ignored and overwritten.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process(&self, path: &Path, force: bool) -> Result<VideoResult> {
        if !path.exists() {
            return Err(DebriefError::FileNotFound(path.display().to_string()));
        }
        let name = stem(path)?;

        let (transcript, transcript_cached) = self.load_or_transcribe(path, force).await?;
        if transcript.full_text.trim().is_empty() {
            return Err(DebriefError::EmptyTranscript);
        }

        let cached_summary = if force {
            None
        } else {
            self.cache.load_summary(path).await?
        };

        let (summary, details, summary_cached) = match cached_summary {
            Some(summary) => {
                info!("Using cached summary for {}", name);
                self.report("Found existing summary, skipping summarization");
                (summary, None, true)
            }
            None => {
                self.report("Summarizing...");
                let result = self.summarizer.summarize(&transcript.full_text).await?;
                if result.fallback_used {
                    self.report("Final consolidation failed; saved a concatenated summary instead");
                } else if result.failed_parts > 0 {
                    self.report(&format!(
                        "Summary complete ({} part(s) unavailable)",
                        result.failed_parts
                    ));
                } else {
                    self.report("Summary complete");
                }
                (result.text.clone(), Some(result), false)
            }
        };

        let summary_path = if summary_cached {
            self.cache.summary_path(path)?
        } else {
            self.cache.save_summary(path, &summary).await?
        };

        Ok(VideoResult {
            source: path.to_path_buf(),
            name,
            transcript,
            summary,
            summary_path,
            transcript_cached,
            summary_cached,
            details,
        })
    }

    async fn load_or_transcribe(&self, path: &Path, force: bool) -> Result<(Transcript, bool)> {
        if is_text_input(path) {
            let text = tokio::fs::read_to_string(path).await?;
            return Ok((Transcript::from_text(stem(path)?, text), true));
        }

        if !force {
            if let Some(transcript) = self.cache.load_transcript(path).await? {
                self.report(&format!(
                    "Found existing transcript ({} segments), skipping transcription",
                    transcript.segments.len()
                ));
                return Ok((transcript, true));
            }
        }

        self.report("Transcribing...");
        let transcript = self.transcriber.transcribe(path).await?;
        // Saved before summarizing so a failed summary never costs a re-transcription
        self.cache.save_transcript(path, &transcript).await?;
        self.report(&format!(
            "Transcription complete ({} segments)",
            transcript.segments.len()
        ));

        Ok((transcript, false))
    }
}

/// OpenAI-backed summarizer with the configured prompts.
pub fn default_summarizer(settings: &Settings) -> Result<Summarizer> {
    let prompts = Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )?;
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiLlm::from_settings(settings)?);
    Ok(Summarizer::new(llm, prompts, settings.summarization.clone()))
}

/// Whether `path` holds a plain-text transcript.
pub fn is_text_input(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| TEXT_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::mock::MockLlm;
    use crate::retry::RetryPolicy;
    use crate::transcription::TranscriptSegment;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Transcriber that returns a fixed transcript derived from the file name.
    pub(crate) struct FakeTranscriber {
        pub calls: AtomicUsize,
    }

    impl FakeTranscriber {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(&self, media_path: &Path) -> Result<Transcript> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = stem(media_path)?;
            Ok(Transcript::new(
                name.clone(),
                vec![
                    TranscriptSegment::new(0.0, 4.0, format!("Meeting {} starts.", name)),
                    TranscriptSegment::new(4.0, 9.0, "We decided to migrate.".into()),
                ],
            ))
        }
    }

    pub(crate) fn test_pipeline(
        dir: &Path,
        llm: Arc<MockLlm>,
        transcriber: Arc<FakeTranscriber>,
    ) -> Pipeline {
        let mut settings = Settings::default();
        settings.general.output_dir = dir.join("out").display().to_string();
        let summarizer = Summarizer::new(llm, Prompts::default(), settings.summarization.clone())
            .with_retry_policy(RetryPolicy::immediate(2));
        Pipeline::with_components(&settings, transcriber, Arc::new(summarizer)).quiet()
    }

    fn touch(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_process_then_reuse_cache() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(MockLlm::new(|_, _| Ok("## Overview\n\nMigration agreed.".into())));
        let transcriber = Arc::new(FakeTranscriber::new());
        let pipeline = test_pipeline(dir.path(), llm.clone(), transcriber.clone());
        let video = touch(dir.path(), "kickoff.mp4", "");

        let first = pipeline.process(&video, false).await.unwrap();
        assert!(!first.transcript_cached);
        assert!(!first.summary_cached);
        assert_eq!(first.summary, "## Overview\n\nMigration agreed.");
        assert!(first.summary_path.ends_with("kickoff_summary.md"));
        assert!(dir.path().join("out/kickoff_transcript.txt").exists());
        assert!(dir.path().join("out/kickoff_segments.txt").exists());

        let second = pipeline.process(&video, false).await.unwrap();
        assert!(second.transcript_cached);
        assert!(second.summary_cached);
        assert_eq!(second.summary, first.summary);
        assert_eq!(second.transcript.segments, first.transcript.segments);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_force_recomputes() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(MockLlm::new(|_, _| Ok("summary".into())));
        let transcriber = Arc::new(FakeTranscriber::new());
        let pipeline = test_pipeline(dir.path(), llm.clone(), transcriber.clone());
        let video = touch(dir.path(), "kickoff.mp4", "");

        pipeline.process(&video, false).await.unwrap();
        let forced = pipeline.process(&video, true).await.unwrap();

        assert!(!forced.transcript_cached);
        assert!(!forced.summary_cached);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_text_input_skips_transcription() {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(MockLlm::echo());
        let transcriber = Arc::new(FakeTranscriber::new());
        let pipeline = test_pipeline(dir.path(), llm.clone(), transcriber.clone());
        let notes = touch(dir.path(), "notes.txt", "Carol will write the RFC by Monday.");

        let result = pipeline.process(&notes, false).await.unwrap();

        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
        assert!(result.summary.contains("Carol will write the RFC by Monday."));
        assert!(!dir.path().join("out/notes_transcript.txt").exists());
    }

    #[tokio::test]
    async fn test_empty_text_input_is_an_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(
            dir.path(),
            Arc::new(MockLlm::echo()),
            Arc::new(FakeTranscriber::new()),
        );
        let notes = touch(dir.path(), "blank.md", "\n \n");

        let result = pipeline.process(&notes, false).await;
        assert!(matches!(result, Err(DebriefError::EmptyTranscript)));
    }

    #[tokio::test]
    async fn test_missing_input() {
        let dir = TempDir::new().unwrap();
        let pipeline = test_pipeline(
            dir.path(),
            Arc::new(MockLlm::echo()),
            Arc::new(FakeTranscriber::new()),
        );

        let result = pipeline.process(&dir.path().join("nope.mp4"), false).await;
        assert!(matches!(result, Err(DebriefError::FileNotFound(_))));
    }

    #[test]
    fn test_is_text_input() {
        assert!(is_text_input(Path::new("a.txt")));
        assert!(is_text_input(Path::new("a.MD")));
        assert!(!is_text_input(Path::new("a.mp4")));
    }
}
