//! Error types for Debrief.

use thiserror::Error;

/// Library-level error type for Debrief operations.
#[derive(Error, Debug)]
pub enum DebriefError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("Audio processing failed: {0}")]
    Audio(String),

    /// A failed call to the language model.
    ///
    /// `retryable` is false for requests the API rejected outright
    /// (malformed input, bad credentials); those are never retried.
    #[error("LLM request failed: {message}")]
    Llm { message: String, retryable: bool },

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Transcript is empty; nothing to summarize")]
    EmptyTranscript,

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Handover error: {0}")]
    Handover(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DebriefError {
    /// Build a retryable LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        DebriefError::Llm {
            message: message.into(),
            retryable: true,
        }
    }

    /// Build an LLM error that must not be retried.
    pub fn llm_fatal(message: impl Into<String>) -> Self {
        DebriefError::Llm {
            message: message.into(),
            retryable: false,
        }
    }

    /// Whether a failed request is worth repeating.
    pub fn is_retryable(&self) -> bool {
        match self {
            DebriefError::Llm { retryable, .. } => *retryable,
            DebriefError::EmptyResponse | DebriefError::Http(_) | DebriefError::OpenAI(_) => true,
            DebriefError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}

/// Result type alias for Debrief operations.
pub type Result<T> = std::result::Result<T, DebriefError>;
