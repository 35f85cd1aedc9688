//! Configuration settings for Debrief.

use crate::error::{DebriefError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub transcription: TranscriptionSettings,
    pub summarization: SummarizationSettings,
    pub handover: HandoverSettings,
    pub prompts: PromptSettings,
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for transcripts, summaries and reports.
    pub output_dir: String,
    /// Directory for temporary audio files.
    pub temp_dir: String,
    /// Log level without `-v` flags (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            temp_dir: "/tmp/debrief".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used for every summarization request.
    pub model: String,
    /// Sampling temperature. 1.0 is left unset on the request, since some
    /// models reject any explicit value.
    pub temperature: f32,
    /// Per-request timeout.
    pub request_timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 1.0,
            request_timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Transcription service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Whisper model to use.
    pub model: String,
    /// Language hint (ISO-639-1). None = auto-detect.
    pub language: Option<String>,
    /// Duration in seconds for splitting long audio files.
    pub chunk_duration_seconds: u32,
    /// Maximum concurrent audio pieces in flight.
    pub max_concurrent_chunks: usize,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            chunk_duration_seconds: 600,
            max_concurrent_chunks: 3,
        }
    }
}

/// Retry policy for LLM requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff_ms: u64,
    /// Upper bound on any single delay.
    pub max_backoff_ms: u64,
    /// Growth factor applied after each failed attempt.
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

/// Hierarchical summarization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationSettings {
    /// Chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks.
    pub chunk_overlap: usize,
    /// Texts longer than this take the hierarchical path.
    pub hierarchy_char_threshold: usize,
    /// Texts producing more chunks than this take the hierarchical path.
    pub hierarchy_chunk_threshold: usize,
    /// Chunk summaries per group in the fan-in stage.
    pub group_size: usize,
    /// Grouping runs when there are more chunk summaries than this...
    pub group_trigger_chunks: usize,
    /// ...or when their combined length exceeds this many characters.
    pub group_trigger_chars: usize,
    /// Maximum outstanding LLM requests within a stage.
    pub max_concurrent: usize,
    /// Output-token ceiling for each chunk summary.
    pub chunk_max_tokens: u32,
    /// Output-token ceiling for each group summary.
    pub group_max_tokens: u32,
    /// Output-token ceiling for the final combination.
    pub final_max_tokens: u32,
    /// Language every final summary is written in.
    pub output_language: String,
    pub retry: RetrySettings,
}

impl Default for SummarizationSettings {
    fn default() -> Self {
        Self {
            chunk_size: 4000,
            chunk_overlap: 200,
            hierarchy_char_threshold: 4000,
            hierarchy_chunk_threshold: 1,
            group_size: 6,
            group_trigger_chunks: 10,
            group_trigger_chars: 100_000,
            max_concurrent: 4,
            chunk_max_tokens: 4096,
            group_max_tokens: 3072,
            final_max_tokens: 8192,
            output_language: "English".to_string(),
            retry: RetrySettings::default(),
        }
    }
}

impl SummarizationSettings {
    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DebriefError::Config("summarization.chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DebriefError::Config(format!(
                "summarization.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.group_size == 0 {
            return Err(DebriefError::Config("summarization.group_size must be positive".into()));
        }
        if self.max_concurrent == 0 {
            return Err(DebriefError::Config(
                "summarization.max_concurrent must be positive".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DebriefError::Config(
                "summarization.retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.final_max_tokens < self.chunk_max_tokens || self.chunk_max_tokens < self.group_max_tokens {
            return Err(DebriefError::Config(format!(
                "token budgets must satisfy final ({}) >= chunk ({}) >= group ({})",
                self.final_max_tokens, self.chunk_max_tokens, self.group_max_tokens
            )));
        }
        Ok(())
    }
}

/// Handover report settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverSettings {
    /// Maximum videos processed at once.
    pub max_parallel_videos: usize,
    /// HTML report file name (inside the output directory).
    pub report_file: String,
    /// Markdown export directory name (inside the output directory).
    pub markdown_dir: String,
    /// Output-token ceiling for project analysis requests.
    pub analysis_max_tokens: u32,
    /// Above this many characters of per-video summaries, the extraction
    /// prompts read the cross-video synthesis instead.
    pub analysis_input_chars: usize,
}

impl Default for HandoverSettings {
    fn default() -> Self {
        Self {
            max_parallel_videos: 2,
            report_file: "handover_report.html".to_string(),
            markdown_dir: "handover_markdown".to_string(),
            analysis_max_tokens: 8192,
            analysis_input_chars: 100_000,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else if path.is_some() {
            Err(DebriefError::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )))
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DebriefError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(DebriefError::Config(format!(
                "general.log_level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        self.summarization.validate()?;
        if self.handover.max_parallel_videos == 0 {
            return Err(DebriefError::Config(
                "handover.max_parallel_videos must be positive".into(),
            ));
        }
        if self.transcription.max_concurrent_chunks == 0 {
            return Err(DebriefError::Config(
                "transcription.max_concurrent_chunks must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("debrief")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Per-request timeout for the LLM client.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.request_timeout_seconds)
    }
}
