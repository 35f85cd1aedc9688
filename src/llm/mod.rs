//! Language model client abstraction.
//!
//! The summarization engine only ever talks to a [`LlmClient`]; the OpenAI
//! implementation lives in [`openai`], and tests substitute scripted mocks.

mod openai;

#[cfg(test)]
pub(crate) mod mock;

pub use openai::OpenAiLlm;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text completion services.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt`, producing at most `max_output_tokens` tokens.
    ///
    /// Transport failures, rate limits and API errors are returned as
    /// [`crate::error::DebriefError::Llm`]; an empty completion is returned
    /// as-is and judged by the caller.
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String>;

    /// Model identifier, for logs and report metadata.
    fn model(&self) -> &str;
}
