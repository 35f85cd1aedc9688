//! Configuration module for Debrief.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{HandoverPrompts, Prompts, SummaryPrompts, TEMPLATE_NAMES};
pub use settings::{
    GeneralSettings, HandoverSettings, LlmSettings, PromptSettings, RetrySettings, Settings,
    SummarizationSettings, TranscriptionSettings,
};
