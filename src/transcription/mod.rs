//! Speech-to-text transcription.
//!
//! Media files are turned into ordered, timestamped [`TranscriptSegment`]s
//! by a [`Transcriber`]; the OpenAI Whisper implementation is the default.

mod format;
mod models;
mod whisper;

pub use format::{format_transcript, OutputFormat, SegmentExport, TranscriptExport};
pub use models::{parse_segment_lines, Transcript, TranscriptSegment};
pub use whisper::WhisperTranscriber;

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Trait for transcription services.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio or video file into segments ordered by start time.
    async fn transcribe(&self, media_path: &Path) -> Result<Transcript>;
}
