//! Data models for the handover report.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// One processed (or failed) recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoSummary {
    /// File stem.
    pub name: String,
    pub source: PathBuf,
    /// Meeting date taken from the file name.
    pub date: Option<NaiveDateTime>,
    pub summary: String,
    pub duration_seconds: Option<f64>,
    /// Set when the file could not be processed; `summary` is then empty.
    pub error: Option<String>,
}

impl VideoSummary {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// `YYYY-MM-DD`, or `fallback` when the file name carries no date.
    pub fn date_label(&self, fallback: &str) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// High-level analysis returned by the `project_analysis` prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectAnalysis {
    pub project_overview: String,
    pub key_themes: Vec<String>,
    pub decisions: Vec<String>,
    pub risks: Vec<String>,
    pub open_questions: Vec<String>,
    pub technical_stack: Vec<String>,
}

/// A system, service or workstream of the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectComponent {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    /// Free-text relations, e.g. "depends on Billing API".
    pub relationships: Vec<String>,
}

/// A person and what they do on the project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonRole {
    pub name: String,
    pub roles: Vec<String>,
    pub components: Vec<String>,
}

/// A dated (or undated) project event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineEvent {
    #[serde(rename = "video_date", deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

impl Default for TimelineEvent {
    fn default() -> Self {
        Self {
            date: None,
            title: "Event".to_string(),
            description: String::new(),
            event_type: "discussion".to_string(),
        }
    }
}

/// Accept `"YYYY-MM-DD"`, `null`, `"null"` or anything unparseable (as `None`).
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ComponentList {
    pub components: Vec<ProjectComponent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PeopleList {
    pub people: Vec<PersonRole>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EventList {
    pub events: Vec<TimelineEvent>,
}

/// Everything extracted about the project across all recordings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectContext {
    pub analysis: ProjectAnalysis,
    pub components: Vec<ProjectComponent>,
    pub people: Vec<PersonRole>,
    /// Sorted by date; undated events last.
    pub timeline: Vec<TimelineEvent>,
}

/// A named Mermaid diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub name: String,
    pub title: String,
    pub code: String,
}

/// The complete handover document.
#[derive(Debug, Clone, Serialize)]
pub struct HandoverReport {
    pub video_directory: PathBuf,
    pub generated_at: DateTime<Local>,
    pub videos: Vec<VideoSummary>,
    /// Cross-meeting synthesis of all successful summaries.
    pub synthesis: String,
    pub context: ProjectContext,
    pub executive_summary: String,
    pub technical_summary: String,
    pub diagrams: Vec<Diagram>,
}

impl HandoverReport {
    pub fn successful_videos(&self) -> impl Iterator<Item = &VideoSummary> {
        self.videos.iter().filter(|v| v.is_ok())
    }
}
