//! OpenAI Whisper transcription implementation.

use super::{Transcriber, Transcript, TranscriptSegment};
use crate::audio::{extract_audio, split_audio};
use crate::config::Settings;
use crate::error::{DebriefError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::types::{AudioInput, AudioResponseFormat, CreateTranscriptionRequestArgs};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// OpenAI Whisper-based transcriber.
pub struct WhisperTranscriber {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    language: Option<String>,
    chunk_duration_seconds: u32,
    max_concurrent_chunks: usize,
    /// Parent of the per-file scratch directories.
    temp_root: PathBuf,
    show_progress: bool,
}

impl WhisperTranscriber {
    /// Create a transcriber from the `[transcription]` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(settings.request_timeout())?,
            model: settings.transcription.model.clone(),
            language: settings.transcription.language.clone(),
            chunk_duration_seconds: settings.transcription.chunk_duration_seconds,
            max_concurrent_chunks: settings.transcription.max_concurrent_chunks.max(1),
            temp_root: settings.temp_dir(),
            show_progress: true,
        })
    }

    /// Suppress the progress bar, for runs where several files are transcribed at once.
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    /// Transcribe a single audio file (no splitting).
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe_single(&self, audio_path: &Path) -> Result<Vec<TranscriptSegment>> {
        debug!("Transcribing audio file");

        let file_bytes = tokio::fs::read(audio_path).await?;

        let mut request_builder = CreateTranscriptionRequestArgs::default();
        request_builder
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .response_format(AudioResponseFormat::VerboseJson);

        if let Some(lang) = &self.language {
            request_builder.language(lang);
        }

        let request = request_builder
            .build()
            .map_err(|e| DebriefError::Transcription(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .audio()
            .transcribe_verbose_json(request)
            .await
            .map_err(|e| DebriefError::OpenAI(format!("Whisper API error: {}", e)))?;

        let segments: Vec<TranscriptSegment> = match response.segments {
            Some(segs) => segs
                .iter()
                .map(|s| TranscriptSegment::new(s.start as f64, s.end as f64, s.text.trim().to_string()))
                .filter(|s| !s.text.is_empty())
                .collect(),
            // No segment detail: one segment spanning the whole response
            None => vec![TranscriptSegment::new(
                0.0,
                response.duration as f64,
                response.text.trim().to_string(),
            )],
        };

        debug!("Transcribed {} segments", segments.len());
        Ok(segments)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("  {spinner:.green} Whisper   [{bar:30.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }
}

/// Shift every segment by its piece's offset and concatenate in piece order.
fn merge_pieces(mut pieces: Vec<(usize, f64, Vec<TranscriptSegment>)>) -> Vec<TranscriptSegment> {
    pieces.sort_by_key(|(idx, _, _)| *idx);

    let mut all_segments = Vec::new();
    for (_, time_offset, mut segments) in pieces {
        for segment in &mut segments {
            segment.start_seconds += time_offset;
            segment.end_seconds += time_offset;
        }
        all_segments.extend(segments);
    }
    all_segments
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    #[instrument(skip(self), fields(path = %media_path.display()))]
    async fn transcribe(&self, media_path: &Path) -> Result<Transcript> {
        let media_id = media_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        std::fs::create_dir_all(&self.temp_root)?;
        let temp_dir = tempfile::Builder::new()
            .prefix("debrief-")
            .tempdir_in(&self.temp_root)?;
        let audio = extract_audio(media_path, temp_dir.path()).await?;
        let pieces = split_audio(&audio, &temp_dir.path().join("pieces"), self.chunk_duration_seconds).await?;

        let piece_count = pieces.len();
        info!("Transcribing {} audio piece(s) with {}", piece_count, self.model);

        let pb = self.progress_bar(piece_count);
        let mut results = Vec::with_capacity(piece_count);

        // Fail fast: a transcript with a hole in it is not worth summarizing
        let mut stream = stream::iter(pieces.into_iter().enumerate())
            .map(|(idx, (piece_path, time_offset))| async move {
                let result = self.transcribe_single(&piece_path).await;
                (idx, time_offset, result)
            })
            .buffer_unordered(self.max_concurrent_chunks);

        while let Some((idx, time_offset, result)) = stream.next().await {
            pb.inc(1);
            match result {
                Ok(segments) => results.push((idx, time_offset, segments)),
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(DebriefError::Transcription(format!(
                        "Audio piece {} at {:.0}s failed: {}",
                        idx + 1,
                        time_offset,
                        e
                    )));
                }
            }
        }

        pb.finish_and_clear();
        Ok(Transcript::new(media_id, merge_pieces(results)))
    }
}
