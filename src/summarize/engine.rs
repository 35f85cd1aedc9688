//! Hierarchical summarization controller.
//!
//! A transcript goes through up to three strictly sequential stages:
//!
//! 1. **Chunk** – one request per [`TextChunk`], fanned out in parallel.
//! 2. **Group** – consecutive chunk summaries are consolidated in batches of
//!    `group_size`, again in parallel. Skipped for small inputs.
//! 3. **Final** – exactly one request merges everything into the report.
//!
//! Chunk and group failures are absorbed as placeholders; a failed final
//! request degrades to [`fallback_summary`]. Short transcripts skip straight
//! to the final stage.

use super::chunker::{split_text, TextChunk};
use crate::config::{Prompts, SummarizationSettings};
use crate::error::{DebriefError, Result};
use crate::llm::LlmClient;
use crate::retry::{require_text, retry_with_backoff, RetryPolicy};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Section headings every final report carries, in order.
pub const REPORT_SECTIONS: [&str; 6] = [
    "Overview",
    "Participants",
    "Discussion Points",
    "Decisions",
    "Action Items",
    "Open Questions",
];

/// Stage a part summary was produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Chunk,
    Group,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Chunk => write!(f, "Chunk"),
            Stage::Group => write!(f, "Group"),
        }
    }
}

/// Outcome of one chunk or group request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartStatus {
    Completed,
    Failed,
}

/// Summary of one unit of work, positioned by `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSummary {
    pub index: usize,
    pub text: String,
    pub status: PartStatus,
}

impl PartSummary {
    pub fn completed(index: usize, text: String) -> Self {
        Self {
            index,
            text,
            status: PartStatus::Completed,
        }
    }

    /// Placeholder for a unit that failed after all retries.
    pub fn failed(index: usize, stage: Stage) -> Self {
        Self {
            index,
            text: placeholder(stage, index),
            status: PartStatus::Failed,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == PartStatus::Failed
    }
}

/// Deterministic stand-in text for a failed unit (1-based in the text).
pub fn placeholder(stage: Stage, index: usize) -> String {
    format!("[{} {} summarization failed - content unavailable]", stage, index + 1)
}

/// Which path the engine took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Whole text sent to the final stage in one request.
    Flat,
    /// Chunk stage, optional group stage, final stage.
    Hierarchical,
    /// Several finished summaries merged into one synthesis.
    Synthesis,
}

/// The engine's result, with enough bookkeeping to explain how it was made.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalSummary {
    pub text: String,
    pub mode: SummaryMode,
    /// Chunks (or input summaries, for a synthesis) fed into the first stage.
    pub chunk_count: usize,
    /// Groups produced; zero when the group stage was skipped.
    pub group_count: usize,
    /// Chunk and group units replaced by placeholders.
    pub failed_parts: usize,
    /// True when the final request failed and the text is the concatenation fallback.
    pub fallback_used: bool,
}

/// Hierarchical summarizer over any [`LlmClient`].
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    prompts: Prompts,
    settings: SummarizationSettings,
    retry: RetryPolicy,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Prompts, settings: SummarizationSettings) -> Self {
        let retry = RetryPolicy::from_settings(&settings.retry);
        Self {
            llm,
            prompts,
            settings,
            retry,
        }
    }

    /// Replace the retry policy derived from settings.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    pub fn settings(&self) -> &SummarizationSettings {
        &self.settings
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    /// Summarize one transcript.
    ///
    /// Only an empty or whitespace-only transcript is an error; every
    /// downstream failure is absorbed into placeholders or the fallback.
    #[instrument(skip(self, transcript), fields(chars = transcript.len()))]
    pub async fn summarize(&self, transcript: &str) -> Result<FinalSummary> {
        let text = transcript.trim();
        if text.is_empty() {
            return Err(DebriefError::EmptyTranscript);
        }

        let chunks = split_text(text, self.settings.chunk_size, self.settings.chunk_overlap)?;
        let input_chars = text.chars().count();

        if input_chars <= self.settings.hierarchy_char_threshold
            && chunks.len() <= self.settings.hierarchy_chunk_threshold
        {
            info!("Flat summarization of {} chars", input_chars);
            let inputs = vec![PartSummary::completed(0, text.to_string())];
            let (text, fallback_used) = self.final_stage("final_summary", text, &inputs).await?;
            return Ok(FinalSummary {
                text,
                mode: SummaryMode::Flat,
                chunk_count: chunks.len(),
                group_count: 0,
                failed_parts: 0,
                fallback_used,
            });
        }

        info!("Hierarchical summarization: {} chars in {} chunks", input_chars, chunks.len());
        let chunk_summaries = self.chunk_stage(&chunks).await?;
        self.reduce(chunk_summaries, "Part", "final_summary", SummaryMode::Hierarchical)
            .await
    }

    /// Merge several finished summaries, in order, into one synthesis.
    ///
    /// The summaries take the place of chunk summaries: they are grouped
    /// under the same trigger and then combined with the `synthesis` template.
    #[instrument(skip(self, summaries), fields(count = summaries.len()))]
    pub async fn summarize_many(&self, summaries: &[String]) -> Result<FinalSummary> {
        if summaries.is_empty() {
            return Err(DebriefError::InvalidInput("no summaries to synthesize".into()));
        }

        let parts = summaries
            .iter()
            .enumerate()
            .map(|(i, s)| PartSummary::completed(i, s.trim().to_string()))
            .collect();

        self.reduce(parts, "Meeting", "synthesis", SummaryMode::Synthesis)
            .await
    }

    /// Complete `prompt` under the retry policy, rejecting empty completions.
    pub async fn complete_with_retry(&self, label: &str, prompt: &str, max_tokens: u32) -> Result<String> {
        let llm = &self.llm;
        retry_with_backoff(&self.retry, label, |_| async move {
            require_text(llm.complete(prompt, max_tokens).await?)
        })
        .await
    }

    async fn chunk_stage(&self, chunks: &[TextChunk]) -> Result<Vec<PartSummary>> {
        let template = self.prompts.get_template("chunk_summary")?;
        let prompts = chunks
            .iter()
            .map(|chunk| self.fill(template, &[("text", &chunk.text)]))
            .collect();

        let summaries = self
            .fan_out(Stage::Chunk, prompts, self.settings.chunk_max_tokens)
            .await;
        Ok(summaries)
    }

    async fn group_stage(&self, parts: &[PartSummary], label: &str) -> Result<Vec<PartSummary>> {
        let template = self.prompts.get_template("group_summary")?;
        let prompts: Vec<String> = parts
            .chunks(self.settings.group_size.max(1))
            .map(|group| self.fill(template, &[("text", &format_parts(label, group))]))
            .collect();

        info!("Consolidating {} summaries into {} groups", parts.len(), prompts.len());
        Ok(self
            .fan_out(Stage::Group, prompts, self.settings.group_max_tokens)
            .await)
    }

    /// Optional group stage followed by the final stage.
    async fn reduce(
        &self,
        parts: Vec<PartSummary>,
        label: &str,
        final_template: &str,
        mode: SummaryMode,
    ) -> Result<FinalSummary> {
        let chunk_count = parts.len();
        let mut failed_parts = parts.iter().filter(|p| p.is_failed()).count();

        let (inputs, input_label, group_count) = if self.needs_grouping(&parts) {
            let groups = self.group_stage(&parts, label).await?;
            failed_parts += groups.iter().filter(|g| g.is_failed()).count();
            let count = groups.len();
            (groups, "Section", count)
        } else {
            debug!("Group stage skipped for {} summaries", parts.len());
            (parts, label, 0)
        };

        let combined = format_parts(input_label, &inputs);
        let (text, fallback_used) = self.final_stage(final_template, &combined, &inputs).await?;

        Ok(FinalSummary {
            text,
            mode,
            chunk_count,
            group_count,
            failed_parts,
            fallback_used,
        })
    }

    fn needs_grouping(&self, parts: &[PartSummary]) -> bool {
        let total_chars: usize = parts.iter().map(|p| p.text.chars().count()).sum();
        parts.len() > self.settings.group_trigger_chunks
            || total_chars > self.settings.group_trigger_chars
    }

    /// One request; on permanent failure, the concatenation fallback.
    async fn final_stage(
        &self,
        template_name: &str,
        combined: &str,
        inputs: &[PartSummary],
    ) -> Result<(String, bool)> {
        let template = self.prompts.get_template(template_name)?;
        let prompt = self.fill(
            template,
            &[
                ("combined_text", combined),
                ("language", &self.settings.output_language),
            ],
        );

        match self
            .complete_with_retry("Final", &prompt, self.settings.final_max_tokens)
            .await
        {
            Ok(text) => Ok((text, false)),
            Err(e) => {
                warn!("Final combination failed, using concatenation fallback: {}", e);
                Ok((fallback_summary(inputs)?, true))
            }
        }
    }

    /// Run one request per prompt with at most `max_concurrent` in flight.
    ///
    /// Results land in slots addressed by input position, so completion
    /// order never leaks into the output.
    async fn fan_out(&self, stage: Stage, prompts: Vec<String>, max_tokens: u32) -> Vec<PartSummary> {
        let mut slots: Vec<Option<String>> = vec![None; prompts.len()];

        let mut results = stream::iter(prompts.into_iter().enumerate())
            .map(|(idx, prompt)| async move {
                let label = format!("{} {}", stage, idx + 1);
                let result = self.complete_with_retry(&label, &prompt, max_tokens).await;
                (idx, result)
            })
            .buffer_unordered(self.settings.max_concurrent.max(1));

        while let Some((idx, result)) = results.next().await {
            match result {
                Ok(text) => slots[idx] = Some(text),
                Err(e) => warn!("{} {} failed permanently: {}", stage, idx + 1, e),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| match slot {
                Some(text) => PartSummary::completed(idx, text),
                None => PartSummary::failed(idx, stage),
            })
            .collect()
    }

    fn fill(&self, template: &str, vars: &[(&str, &str)]) -> String {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.prompts.render_with_custom(template, &vars)
    }
}

/// Label each part with its 1-based position.
fn format_parts(label: &str, parts: &[PartSummary]) -> String {
    parts
        .iter()
        .map(|p| format!("{} {}:\n{}", label, p.index + 1, p.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Concatenate `inputs` under the standard report headings.
///
/// Used when the final request cannot be completed. Fails only when there is
/// nothing to concatenate.
pub fn fallback_summary(inputs: &[PartSummary]) -> Result<String> {
    if inputs.is_empty() {
        return Err(DebriefError::Summarization(
            "no summaries available to build a report from".into(),
        ));
    }

    let mut out = String::new();
    for section in REPORT_SECTIONS {
        out.push_str(&format!("## {}\n\n", section));
        match section {
            "Overview" => out.push_str(&format!(
                "Automatic consolidation was unavailable. The {} partial summaries are reproduced below in order.\n\n",
                inputs.len()
            )),
            "Discussion Points" => {
                for part in inputs {
                    out.push_str(&format!("### Part {}\n\n{}\n\n", part.index + 1, part.text.trim()));
                }
            }
            _ => out.push_str("Not consolidated; see Discussion Points.\n\n"),
        }
    }

    Ok(out.trim_end().to_string())
}
