//! Debrief - meeting recordings in, structured summaries out
//!
//! Debrief transcribes meeting recordings and condenses them into
//! structured reports, even when a transcript is far larger than what a
//! language model accepts in one request.
//!
//! # Overview
//!
//! - Transcribe audio/video files with Whisper (via ffmpeg)
//! - Summarize transcripts of any length with a chunk → group → final pipeline
//! - Cache transcripts and summaries next to each other on disk
//! - Turn a directory of meeting videos into a project handover report
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `llm` - Completion client abstraction (OpenAI implementation)
//! - `retry` - Bounded exponential backoff for LLM requests
//! - `summarize` - Text chunking and the hierarchical summarization engine
//! - `audio` - ffmpeg/ffprobe helpers
//! - `transcription` - Speech-to-text and transcript export formats
//! - `cache` - On-disk transcript and summary artifacts
//! - `pipeline` - Single-file transcribe → summarize → cache
//! - `handover` - Multi-video analysis, diagrams and HTML report
//!
//! # Example
//!
//! ```rust,no_run
//! use debrief::config::Settings;
//! use debrief::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = Pipeline::new(&settings)?;
//!
//!     let result = pipeline.process(Path::new("standup.mp4"), false).await?;
//!     println!("{}", result.summary);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod handover;
pub mod llm;
pub mod openai;
pub mod pipeline;
pub mod retry;
pub mod summarize;
pub mod transcription;

pub use error::{DebriefError, Result};
