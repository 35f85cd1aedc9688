//! Project handover: many recordings in, one report out.
//!
//! Each video goes through the single-file [`Pipeline`](crate::pipeline::Pipeline);
//! the resulting summaries are synthesized, mined for project context with
//! JSON-returning prompts, and rendered as an HTML report with Mermaid
//! diagrams plus a few Markdown files.

mod analyzer;
mod diagrams;
mod discovery;
mod models;
mod pipeline;
mod render;

pub use analyzer::{format_project_context, parse_json_response, HandoverAnalyzer};
pub use diagrams::{generate_all as generate_diagrams, sanitize as sanitize_label};
pub use discovery::{discover_videos, extract_date};
pub use models::{
    Diagram, HandoverReport, PersonRole, ProjectAnalysis, ProjectComponent, ProjectContext,
    TimelineEvent, VideoSummary,
};
pub use pipeline::{HandoverOutcome, HandoverPipeline};
pub use render::{export_markdown, html_escape, markdown_to_html, render_html, write_html};
