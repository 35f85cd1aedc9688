//! OpenAI chat completions implementation.

use super::LlmClient;
use crate::config::Settings;
use crate::error::{DebriefError, Result};
use crate::openai::create_client_with_timeout;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// API error types that no amount of retrying will fix.
const NON_RETRYABLE_ERROR_TYPES: &[&str] = &[
    "invalid_request_error",
    "authentication_error",
    "permission_error",
    "not_found_error",
];

/// OpenAI-based completion client.
pub struct OpenAiLlm {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiLlm {
    /// Create a client from the `[llm]` settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(settings.request_timeout())?,
            model: settings.llm.model.clone(),
            temperature: settings.llm.temperature,
        })
    }
}

/// Map an OpenAI error to a classified [`DebriefError::Llm`].
fn classify(err: OpenAIError) -> DebriefError {
    match err {
        OpenAIError::ApiError(api) => {
            let fatal = api
                .r#type
                .as_deref()
                .is_some_and(|t| NON_RETRYABLE_ERROR_TYPES.contains(&t));
            let message = format!("OpenAI API error: {}", api.message);
            if fatal {
                DebriefError::llm_fatal(message)
            } else {
                DebriefError::llm(message)
            }
        }
        OpenAIError::InvalidArgument(msg) => {
            DebriefError::llm_fatal(format!("Invalid request: {}", msg))
        }
        other => DebriefError::llm(other.to_string()),
    }
}

#[async_trait]
impl LlmClient for OpenAiLlm {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str, max_output_tokens: u32) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.to_string())
                .build()
                .map_err(|e| DebriefError::llm_fatal(e.to_string()))?
                .into(),
        ];

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(max_output_tokens);

        // Some models only accept the default temperature
        if (self.temperature - 1.0).abs() > f32::EPSILON {
            request_builder.temperature(self.temperature);
        }

        let request = request_builder
            .build()
            .map_err(|e| DebriefError::llm_fatal(format!("Failed to build request: {}", e)))?;

        let response = self.client.chat().create(request).await.map_err(classify)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Completion returned {} chars", content.len());
        Ok(content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}
