//! Prompt templates for Debrief.
//!
//! Every template is addressable by name through [`Prompts::get_template`].
//! Defaults are built in; they can be customized by placing `summary.toml`
//! and/or `handover.toml` in the custom prompts directory.

use crate::error::{DebriefError, Result};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").ok());

/// Names accepted by [`Prompts::get_template`].
pub const TEMPLATE_NAMES: &[&str] = &[
    "chunk_summary",
    "group_summary",
    "final_summary",
    "synthesis",
    "project_analysis",
    "component_extraction",
    "people_roles_extraction",
    "timeline_extraction",
    "executive_summary",
    "technical_summary",
];

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summary: SummaryPrompts,
    pub handover: HandoverPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the hierarchical summarization stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryPrompts {
    /// First stage; `{{text}}` is one transcript chunk.
    pub chunk_summary: String,
    /// Intermediate stage; `{{text}}` is a batch of numbered chunk summaries.
    pub group_summary: String,
    /// Last stage; `{{combined_text}}` and `{{language}}`.
    pub final_summary: String,
    /// Cross-video last stage; `{{combined_text}}` and `{{language}}`.
    pub synthesis: String,
}

impl Default for SummaryPrompts {
    fn default() -> Self {
        Self {
            chunk_summary: r#"You are summarizing one excerpt of a longer meeting transcript. The excerpt may start or end mid-sentence.

Write a detailed summary of this excerpt. Keep:
- Who spoke and what they contributed, when names are mentioned
- Every topic discussed, with the concrete details (numbers, names, systems, dates)
- Any decision, agreement or disagreement
- Any task someone committed to or was asked to do, with owner and deadline if stated
- Questions raised and whether they were answered

Do not invent anything that is not in the excerpt. Write in the language of the excerpt.

Excerpt:
{{text}}"#
                .to_string(),

            group_summary: r#"Below are summaries of consecutive parts of the same meeting, in order.

Combine them into one consolidated summary:
- Merge duplicate points that appear in neighbouring parts (they overlap slightly)
- Keep every distinct topic, decision, action item and open question
- Keep the chronological order of the discussion
- Keep names, numbers and owners exactly as given
- If a part is marked as failed or unavailable, mention that the content of that part is missing

Part summaries:
{{text}}"#
                .to_string(),

            final_summary: r#"You are writing the final summary of a meeting from the partial summaries below, which are in chronological order.

Merge them into one non-redundant structured report with exactly these sections, as Markdown level-2 headings:

## Overview
## Participants
## Discussion Points
## Decisions
## Action Items
## Open Questions

Rules:
- Write the entire report in {{language}}, regardless of the language(s) of the input
- Remove repetition across parts; keep every distinct fact
- Action items list the owner and deadline whenever they are known
- If a section has no content, write "None identified."
- If some parts are marked as failed or unavailable, note the gap in the Overview

Partial summaries:
{{combined_text}}"#
                .to_string(),

            synthesis: r#"Below are summaries of several separate meetings of the same project, in chronological order.

Write a cross-meeting synthesis for someone taking over the project, with exactly these sections, as Markdown level-2 headings:

## Overview
## Participants
## Discussion Points
## Decisions
## Action Items
## Open Questions

Rules:
- Write the entire synthesis in {{language}}
- Describe how topics evolved across meetings; name the meeting when it matters
- Keep only the latest state of decisions that were revisited
- List outstanding action items only once, with owner when known
- If a section has no content, write "None identified."

Meeting summaries:
{{combined_text}}"#
                .to_string(),
        }
    }
}

/// Prompts for cross-video handover analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoverPrompts {
    /// `{{summaries}}` → JSON project overview.
    pub project_analysis: String,
    /// `{{summaries}}` → JSON components.
    pub component_extraction: String,
    /// `{{summaries}}` → JSON people.
    pub people_roles_extraction: String,
    /// `{{summaries_with_dates}}` → JSON timeline events.
    pub timeline_extraction: String,
    /// `{{project_context}}` and `{{language}}`.
    pub executive_summary: String,
    /// `{{project_context}}` and `{{language}}`.
    pub technical_summary: String,
}

impl Default for HandoverPrompts {
    fn default() -> Self {
        Self {
            project_analysis: r#"Analyze these meeting summaries from a single project and extract the overall project picture.

{{summaries}}

Respond with a JSON object only, no commentary:
{
  "project_overview": "2-4 paragraph description of what the project is and where it stands",
  "key_themes": ["recurring theme", "..."],
  "decisions": ["decision that was made", "..."],
  "risks": ["risk or concern raised", "..."],
  "open_questions": ["unresolved question", "..."],
  "technical_stack": ["technology, tool or platform in use", "..."]
}"#
                .to_string(),

            component_extraction: r#"From these meeting summaries, identify the technical components, systems or workstreams of the project.

{{summaries}}

Respond with a JSON object only:
{
  "components": [
    {
      "name": "component name",
      "description": "what it does",
      "technologies": ["technology", "..."],
      "relationships": ["depends on <other component>", "..."]
    }
  ]
}"#
                .to_string(),

            people_roles_extraction: r#"From these meeting summaries, identify the people involved in the project and their roles.

{{summaries}}

Respond with a JSON object only:
{
  "people": [
    {
      "name": "person name",
      "roles": ["role", "..."],
      "components": ["component or area they work on", "..."]
    }
  ]
}"#
                .to_string(),

            timeline_extraction: r#"From these dated meeting summaries, extract the significant project events.

{{summaries_with_dates}}

Respond with a JSON object only:
{
  "events": [
    {
      "video_date": "YYYY-MM-DD or null",
      "title": "short event title",
      "description": "one sentence",
      "type": "decision | milestone | discussion | issue"
    }
  ]
}"#
                .to_string(),

            executive_summary: r#"Write an executive handover summary for a manager taking over this project. Focus on goals, status, key decisions, risks, people to talk to and what needs attention first. Avoid technical detail. Use Markdown headings and bullet lists. Write in {{language}}.

{{project_context}}"#
                .to_string(),

            technical_summary: r#"Write a technical handover summary for an engineer taking over this project. Cover the architecture and components, technical stack, technical decisions and their rationale, known issues and risks, and who owns which part. Use Markdown headings and bullet lists. Write in {{language}}.

{{project_context}}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summary_path = custom_path.join("summary.toml");
            if summary_path.exists() {
                let content = std::fs::read_to_string(&summary_path)?;
                prompts.summary = toml::from_str(&content)?;
            }

            let handover_path = custom_path.join("handover.toml");
            if handover_path.exists() {
                let content = std::fs::read_to_string(&handover_path)?;
                prompts.handover = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Look up a template by name.
    pub fn get_template(&self, name: &str) -> Result<&str> {
        let template = match name {
            "chunk_summary" => &self.summary.chunk_summary,
            "group_summary" => &self.summary.group_summary,
            "final_summary" => &self.summary.final_summary,
            "synthesis" => &self.summary.synthesis,
            "project_analysis" => &self.handover.project_analysis,
            "component_extraction" => &self.handover.component_extraction,
            "people_roles_extraction" => &self.handover.people_roles_extraction,
            "timeline_extraction" => &self.handover.timeline_extraction,
            "executive_summary" => &self.handover.executive_summary,
            "technical_summary" => &self.handover.technical_summary,
            _ => {
                return Err(DebriefError::Prompt(format!(
                    "Prompt '{}' not found. Available prompts: {}",
                    name,
                    TEMPLATE_NAMES.join(", ")
                )))
            }
        };
        Ok(template.as_str())
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass over the template, so
    /// substituted values are never rescanned. Unknown placeholders stay literal.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let Some(re) = PLACEHOLDER.as_ref() else {
            return template.to_string();
        };
        re.replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Look up `name` and render it in one step.
    pub fn render_named(&self, name: &str, vars: &[(&str, &str)]) -> Result<String> {
        let template = self.get_template(name)?;
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(self.render_with_custom(template, &vars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        let prompts = Prompts::default();
        for name in TEMPLATE_NAMES {
            let template = prompts.get_template(name).unwrap();
            assert!(!template.is_empty(), "{} is empty", name);
        }
    }

    #[test]
    fn test_unknown_template() {
        let prompts = Prompts::default();
        let err = prompts.get_template("nope").unwrap_err();
        assert!(err.to_string().contains("chunk_summary"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("text".to_string(), "say {{language}} and {{text}}".to_string());
        vars.insert("language".to_string(), "German".to_string());

        for _ in 0..20 {
            let result = Prompts::render("{{language}}: {{text}} {{unknown}}", &vars);
            assert_eq!(result, "German: say {{language}} and {{text}} {{unknown}}");
        }
    }

    #[test]
    fn test_render_named_prefers_call_variables() {
        let mut prompts = Prompts::default();
        prompts.variables.insert("language".to_string(), "French".to_string());
        prompts.variables.insert("team".to_string(), "Core".to_string());
        prompts.summary.final_summary = "{{team}} in {{language}}: {{combined_text}}".to_string();

        let rendered = prompts
            .render_named("final_summary", &[("language", "Spanish"), ("combined_text", "x")])
            .unwrap();
        assert_eq!(rendered, "Core in Spanish: x");
    }

    #[test]
    fn test_custom_dir_overrides() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summary.toml"),
            "chunk_summary = \"Summarize: {{text}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summary.chunk_summary, "Summarize: {{text}}");
        // Sections not in the file keep their defaults
        assert!(prompts.summary.final_summary.contains("{{combined_text}}"));
        assert!(prompts.handover.project_analysis.contains("{{summaries}}"));
    }
}
