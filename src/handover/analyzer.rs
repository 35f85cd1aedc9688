//! LLM extraction of project context from many meeting summaries.

use super::models::{
    ComponentList, EventList, PeopleList, ProjectAnalysis, ProjectContext, VideoSummary,
};
use crate::config::HandoverSettings;
use crate::error::Result;
use crate::summarize::Summarizer;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Timeline entries included in the context given to the summary prompts.
const CONTEXT_TIMELINE_LIMIT: usize = 10;

/// Runs the handover prompts through a [`Summarizer`]'s client and retry policy.
pub struct HandoverAnalyzer {
    summarizer: Arc<Summarizer>,
    settings: HandoverSettings,
}

impl HandoverAnalyzer {
    pub fn new(summarizer: Arc<Summarizer>, settings: HandoverSettings) -> Self {
        Self {
            summarizer,
            settings,
        }
    }

    /// Extract overview, components, people and timeline.
    ///
    /// The four extractions run concurrently. Any that fails or returns
    /// unparseable JSON contributes empty values instead of an error.
    ///
    /// When the per-video summaries exceed `analysis_input_chars`, the
    /// extractions read `synthesis` instead, so every meeting is still covered.
    #[instrument(skip_all, fields(videos = videos.len()))]
    pub async fn analyze(&self, videos: &[VideoSummary], synthesis: &str) -> Result<ProjectContext> {
        let (summaries, dated) = self.analysis_inputs(videos, synthesis);

        let (analysis, components, people, events) = tokio::join!(
            self.extract::<ProjectAnalysis>("project_analysis", "summaries", &summaries),
            self.extract::<ComponentList>("component_extraction", "summaries", &summaries),
            self.extract::<PeopleList>("people_roles_extraction", "summaries", &summaries),
            self.extract::<EventList>("timeline_extraction", "summaries_with_dates", &dated),
        );

        let analysis = analysis?.unwrap_or_else(|| ProjectAnalysis {
            project_overview: "Unable to extract a project overview automatically.".to_string(),
            ..Default::default()
        });

        let mut timeline = events?.unwrap_or_default().events;
        // Undated events sort last
        timeline.sort_by_key(|e| (e.date.is_none(), e.date));

        let context = ProjectContext {
            analysis,
            components: components?.unwrap_or_default().components,
            people: people?.unwrap_or_default().people,
            timeline,
        };

        info!(
            "Project context: {} themes, {} people, {} components, {} events, {} decisions",
            context.analysis.key_themes.len(),
            context.people.len(),
            context.components.len(),
            context.timeline.len(),
            context.analysis.decisions.len()
        );
        Ok(context)
    }

    /// Manager-oriented handover summary.
    pub async fn executive_summary(&self, context: &ProjectContext) -> Result<String> {
        self.persona_summary("executive_summary", &format_project_context(context, false))
            .await
    }

    /// Engineer-oriented handover summary.
    pub async fn technical_summary(&self, context: &ProjectContext) -> Result<String> {
        self.persona_summary("technical_summary", &format_project_context(context, true))
            .await
    }

    async fn persona_summary(&self, template_name: &str, project_context: &str) -> Result<String> {
        let prompt = self.render(
            template_name,
            &[
                ("project_context", project_context),
                ("language", &self.summarizer.settings().output_language),
            ],
        )?;

        match self
            .summarizer
            .complete_with_retry(template_name, &prompt, self.settings.analysis_max_tokens)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("{} failed, using the raw project context: {}", template_name, e);
                Ok(format!(
                    "_Automatic summary unavailable ({})._\n\n{}",
                    e, project_context
                ))
            }
        }
    }

    /// Render `template_name`, ask for JSON, and parse it.
    ///
    /// `Ok(None)` means the request failed or the answer was not valid JSON.
    async fn extract<T: DeserializeOwned>(
        &self,
        template_name: &str,
        key: &str,
        value: &str,
    ) -> Result<Option<T>> {
        let prompt = self.render(template_name, &[(key, value)])?;

        let response = match self
            .summarizer
            .complete_with_retry(template_name, &prompt, self.settings.analysis_max_tokens)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                warn!("{} request failed: {}", template_name, e);
                return Ok(None);
            }
        };

        match parse_json_response::<T>(&response) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                warn!("{} returned invalid JSON: {}", template_name, e);
                Ok(None)
            }
        }
    }

    fn render(&self, template_name: &str, vars: &[(&str, &str)]) -> Result<String> {
        self.summarizer.prompts().render_named(template_name, vars)
    }

    /// Inputs for the plain and the dated extraction prompts.
    fn analysis_inputs(&self, videos: &[VideoSummary], synthesis: &str) -> (String, String) {
        let summaries = summaries_text(videos);
        let dated = summaries_with_dates(videos);
        let limit = self.settings.analysis_input_chars;
        if summaries.chars().count() <= limit && dated.chars().count() <= limit {
            return (summaries, dated);
        }

        info!(
            "Meeting summaries exceed {} characters, analyzing the synthesis instead",
            limit
        );
        let index = videos
            .iter()
            .filter(|v| v.is_ok())
            .map(|v| format!("Date: {}\nVideo: {}\n", v.date_label("null"), v.name))
            .collect::<Vec<_>>()
            .join("\n---\n");
        (
            format!("--- Synthesis of all meetings ---\n{}\n", synthesis),
            format!("{}\n---\nSummary of all meetings: {}\n", index, synthesis),
        )
    }
}

fn summaries_text(videos: &[VideoSummary]) -> String {
    videos
        .iter()
        .filter(|v| v.is_ok())
        .enumerate()
        .map(|(i, v)| {
            format!(
                "--- Video {}: {} ({}) ---\n{}\n",
                i + 1,
                v.name,
                v.date_label("Unknown date"),
                v.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn summaries_with_dates(videos: &[VideoSummary]) -> String {
    videos
        .iter()
        .filter(|v| v.is_ok())
        .map(|v| {
            format!(
                "Date: {}\nVideo: {}\nSummary: {}\n",
                v.date_label("null"),
                v.name,
                v.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

/// Parse a JSON answer, tolerating Markdown code fences and surrounding prose.
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> serde_json::Result<T> {
    let text = response.trim();

    let body = if let Some((_, rest)) = text.split_once("```json") {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some((_, rest)) = text.split_once("```") {
        rest.split("```").next().unwrap_or(rest)
    } else {
        text
    };

    let body = body.trim();
    match serde_json::from_str(body) {
        Ok(parsed) => Ok(parsed),
        Err(e) => match (body.find('{'), body.rfind('}')) {
            (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end]),
            _ => Err(e),
        },
    }
}

/// Plain-text rendering of the context for the persona prompts.
pub fn format_project_context(context: &ProjectContext, technical: bool) -> String {
    let analysis = &context.analysis;
    let mut lines: Vec<String> = Vec::new();

    fn list(lines: &mut Vec<String>, title: &str, items: &[String]) {
        if items.is_empty() {
            return;
        }
        lines.push(format!("{}:", title));
        lines.extend(items.iter().map(|i| format!("  - {}", i)));
        lines.push(String::new());
    }

    lines.push("PROJECT OVERVIEW:".to_string());
    lines.push(analysis.project_overview.clone());
    lines.push(String::new());

    list(&mut lines, "KEY THEMES", &analysis.key_themes);

    if technical {
        list(&mut lines, "TECHNICAL STACK", &analysis.technical_stack);

        if !context.components.is_empty() {
            lines.push("COMPONENTS:".to_string());
            for comp in &context.components {
                lines.push(format!("  • {}: {}", comp.name, comp.description));
                if !comp.technologies.is_empty() {
                    lines.push(format!("    Technologies: {}", comp.technologies.join(", ")));
                }
            }
            lines.push(String::new());
        }
    }

    if !context.people.is_empty() {
        lines.push("PEOPLE & ROLES:".to_string());
        for person in &context.people {
            let roles = if person.roles.is_empty() {
                "Team member".to_string()
            } else {
                person.roles.join(", ")
            };
            lines.push(format!("  • {} - {}", person.name, roles));
            if !person.components.is_empty() {
                lines.push(format!("    Works on: {}", person.components.join(", ")));
            }
        }
        lines.push(String::new());
    }

    list(&mut lines, "KEY DECISIONS", &analysis.decisions);
    list(&mut lines, "RISKS & CONCERNS", &analysis.risks);
    list(&mut lines, "OPEN QUESTIONS", &analysis.open_questions);

    if !context.timeline.is_empty() {
        lines.push("TIMELINE HIGHLIGHTS:".to_string());
        for event in context.timeline.iter().take(CONTEXT_TIMELINE_LIMIT) {
            let date = event
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "TBD".to_string());
            lines.push(format!("  • [{}] {}: {}", date, event.title, event.description));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Prompts, SummarizationSettings};
    use crate::error::DebriefError;
    use crate::handover::models::{PersonRole, ProjectComponent, TimelineEvent};
    use crate::llm::mock::MockLlm;
    use crate::retry::RetryPolicy;
    use chrono::NaiveDate;

    fn analyzer(llm: Arc<MockLlm>) -> HandoverAnalyzer {
        let summarizer = Summarizer::new(llm, Prompts::default(), SummarizationSettings::default())
            .with_retry_policy(RetryPolicy::immediate(2));
        HandoverAnalyzer::new(Arc::new(summarizer), HandoverSettings::default())
    }

    fn videos() -> Vec<VideoSummary> {
        vec![
            VideoSummary {
                name: "2024-02-01 kickoff".into(),
                source: "2024-02-01 kickoff.mp4".into(),
                date: NaiveDate::from_ymd_opt(2024, 2, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
                summary: "Dana leads the billing rewrite.".into(),
                duration_seconds: None,
                error: None,
            },
            VideoSummary {
                name: "broken".into(),
                source: "broken.mp4".into(),
                date: None,
                summary: String::new(),
                duration_seconds: None,
                error: Some("ffmpeg failed".into()),
            },
        ]
    }

    /// Answers each extraction prompt by recognizing its opening words.
    fn scripted(prompt: &str) -> crate::error::Result<String> {
        if prompt.starts_with("Analyze these meeting summaries") {
            Ok("```json\n{\"project_overview\": \"Billing rewrite\", \"decisions\": [\"Adopt Postgres\"]}\n```".into())
        } else if prompt.contains("identify the technical components") {
            Ok(r#"{"components": [{"name": "Billing API", "technologies": ["Rust"]}]}"#.into())
        } else if prompt.contains("identify the people") {
            Ok(r#"Sure! {"people": [{"name": "Dana", "roles": ["Tech lead"]}]} Hope this helps."#.into())
        } else if prompt.contains("extract the significant project events") {
            Ok(r#"{"events": [
                {"video_date": null, "title": "Open question"},
                {"video_date": "2024-02-08", "title": "Schema frozen", "type": "milestone"},
                {"video_date": "2024-02-01", "title": "Kickoff", "type": "milestone"}
            ]}"#
            .into())
        } else {
            Ok(format!("SUMMARY OF:\n{}", prompt))
        }
    }

    #[tokio::test]
    async fn test_analyze_parses_all_extractions() {
        let llm = Arc::new(MockLlm::new(|p, _| scripted(p)));
        let context = analyzer(llm.clone()).analyze(&videos(), "unused synthesis").await.unwrap();

        assert_eq!(context.analysis.project_overview, "Billing rewrite");
        assert_eq!(context.analysis.decisions, vec!["Adopt Postgres"]);
        assert_eq!(context.components[0].name, "Billing API");
        assert_eq!(context.people[0].roles, vec!["Tech lead"]);
        let titles: Vec<_> = context.timeline.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Kickoff", "Schema frozen", "Open question"]);
        assert_eq!(llm.calls_with_budget(8192), 4);

        // Failed recordings are left out of the analysis input
        assert!(llm.calls().iter().all(|(p, _)| !p.contains("broken")));
        assert!(llm
            .calls()
            .iter()
            .any(|(p, _)| p.contains("--- Video 1: 2024-02-01 kickoff (2024-02-01) ---")));
    }

    #[tokio::test]
    async fn test_analyze_tolerates_garbage_and_failures() {
        let llm = Arc::new(MockLlm::new(|p, _| {
            if p.contains("identify the people") {
                Err(DebriefError::llm("timeout"))
            } else {
                Ok("I could not find anything.".into())
            }
        }));

        let context = analyzer(llm).analyze(&videos(), "unused synthesis").await.unwrap();

        assert!(context.analysis.project_overview.starts_with("Unable to extract"));
        assert!(context.components.is_empty());
        assert!(context.people.is_empty());
        assert!(context.timeline.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_input_uses_synthesis() {
        let llm = Arc::new(MockLlm::new(|p, _| scripted(p)));
        let summarizer = Summarizer::new(llm.clone(), Prompts::default(), SummarizationSettings::default())
            .with_retry_policy(RetryPolicy::immediate(2));
        let settings = HandoverSettings {
            analysis_input_chars: 200,
            ..HandoverSettings::default()
        };
        let analyzer = HandoverAnalyzer::new(Arc::new(summarizer), settings);

        let mut videos = videos();
        videos[0].summary = "Dana leads the billing rewrite. ".repeat(20);
        videos.push(VideoSummary {
            name: "2024-03-01 retro".into(),
            source: "2024-03-01 retro.mp4".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            summary: "Launch moved to April.".into(),
            duration_seconds: None,
            error: None,
        });

        analyzer
            .analyze(&videos, "Kickoff set the plan; the retro moved launch to April.")
            .await
            .unwrap();

        let calls = llm.calls();
        assert_eq!(calls.len(), 4);
        for (prompt, _) in &calls {
            assert!(prompt.contains("the retro moved launch to April"));
            assert!(!prompt.contains("Dana leads the billing rewrite."));
        }
        let timeline_prompt = calls
            .iter()
            .find(|(p, _)| p.contains("extract the significant project events"))
            .map(|(p, _)| p.clone())
            .unwrap();
        assert!(timeline_prompt.contains("Date: 2024-03-01\nVideo: 2024-03-01 retro"));
    }

    #[tokio::test]
    async fn test_persona_summary_falls_back_to_context() {
        let llm = Arc::new(MockLlm::new(|_, _| Err(DebriefError::llm("down"))));
        let context = ProjectContext {
            analysis: ProjectAnalysis {
                project_overview: "Billing rewrite".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let summary = analyzer(llm).executive_summary(&context).await.unwrap();

        assert!(summary.starts_with("_Automatic summary unavailable"));
        assert!(summary.contains("PROJECT OVERVIEW:\nBilling rewrite"));
    }

    #[tokio::test]
    async fn test_persona_prompts_receive_language_and_context() {
        let llm = Arc::new(MockLlm::new(|p, _| scripted(p)));
        let context = ProjectContext::default();

        let technical = analyzer(llm).technical_summary(&context).await.unwrap();

        assert!(technical.contains("Write in English."));
        assert!(technical.contains("PROJECT OVERVIEW:"));
    }

    #[test]
    fn test_parse_json_response_variants() {
        let plain: ProjectAnalysis = parse_json_response(r#"{"risks": ["a"]}"#).unwrap();
        assert_eq!(plain.risks, vec!["a"]);

        let fenced: ProjectAnalysis =
            parse_json_response("```\n{\"risks\": [\"b\"]}\n```").unwrap();
        assert_eq!(fenced.risks, vec!["b"]);

        assert!(parse_json_response::<ProjectAnalysis>("no json here").is_err());
    }

    #[test]
    fn test_format_project_context_sections() {
        let context = ProjectContext {
            analysis: ProjectAnalysis {
                project_overview: "Overview text".into(),
                technical_stack: vec!["Rust".into()],
                risks: vec!["Vendor lock-in".into()],
                ..Default::default()
            },
            components: vec![ProjectComponent {
                name: "Ledger".into(),
                description: "Stores entries".into(),
                ..Default::default()
            }],
            people: vec![PersonRole {
                name: "Eli".into(),
                ..Default::default()
            }],
            timeline: vec![TimelineEvent::default()],
        };

        let executive = format_project_context(&context, false);
        let technical = format_project_context(&context, true);

        assert!(!executive.contains("TECHNICAL STACK"));
        assert!(technical.contains("TECHNICAL STACK:\n  - Rust"));
        assert!(technical.contains("  • Ledger: Stores entries"));
        assert!(executive.contains("  • Eli - Team member"));
        assert!(executive.contains("RISKS & CONCERNS:\n  - Vendor lock-in"));
        assert!(executive.contains("  • [TBD] Event: "));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo".into(), 2), "hé");
        assert_eq!(truncate_chars("hi".into(), 10), "hi");
    }
}
