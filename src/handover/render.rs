//! HTML report and Markdown export.

use super::models::HandoverReport;
use crate::error::Result;
use regex::Regex;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; max-width: 1100px; margin: 0 auto; padding: 2rem; color: #1f2933; line-height: 1.55; }
header { border-bottom: 2px solid #3e4c59; margin-bottom: 2rem; }
h1 { margin-bottom: 0.2rem; }
.meta { color: #616e7c; margin-top: 0; }
nav a { margin-right: 1rem; }
section { margin-bottom: 2.5rem; }
.card { border: 1px solid #cbd2d9; border-radius: 6px; padding: 1rem 1.25rem; margin-bottom: 1rem; }
.tag { display: inline-block; background: #e4e7eb; border-radius: 4px; padding: 0 0.4rem; margin: 0 0.25rem 0.25rem 0; font-size: 0.9em; }
.error { color: #ab091e; }
table { border-collapse: collapse; width: 100%; }
td, th { border: 1px solid #cbd2d9; padding: 0.4rem 0.6rem; text-align: left; vertical-align: top; }
details summary { cursor: pointer; font-weight: 600; }
"#;

static BOLD: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").ok());
static ORDERED_ITEM: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^\d+\.\s+").ok());

/// Escape text for HTML element content and attribute values.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[derive(Clone, Copy, PartialEq)]
enum List {
    Unordered,
    Ordered,
}

impl List {
    fn close(self) -> &'static str {
        match self {
            List::Unordered => "</ul>",
            List::Ordered => "</ol>",
        }
    }
}

/// Convert the Markdown subset LLM summaries use into HTML.
///
/// Handles headings, bold text, bullet and numbered lists and paragraphs.
/// All text is escaped before markup is added.
pub fn markdown_to_html(text: &str) -> String {
    let mut html: Vec<String> = Vec::new();
    let mut open: Option<List> = None;

    for line in text.lines() {
        let line = line.trim();

        if line.is_empty() {
            switch_list(&mut html, &mut open, None);
            continue;
        }

        if let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
            switch_list(&mut html, &mut open, Some(List::Unordered));
            html.push(format!("<li>{}</li>", inline(item)));
            continue;
        }

        if let Some(item) = ordered_item(line) {
            switch_list(&mut html, &mut open, Some(List::Ordered));
            html.push(format!("<li>{}</li>", inline(item)));
            continue;
        }

        switch_list(&mut html, &mut open, None);
        let level = line.chars().take_while(|c| *c == '#').count();
        let element = match level {
            0 => format!("<p>{}</p>", inline(line)),
            1 | 2 => format!("<h3>{}</h3>", inline(line[level..].trim())),
            _ => format!("<h4>{}</h4>", inline(line[level..].trim())),
        };
        html.push(element);
    }
    switch_list(&mut html, &mut open, None);

    html.join("\n")
}

/// Close the open list when it differs from `want`, then open `want`.
fn switch_list(html: &mut Vec<String>, open: &mut Option<List>, want: Option<List>) {
    if *open == want {
        return;
    }
    if let Some(list) = open.take() {
        html.push(list.close().to_string());
    }
    match want {
        Some(List::Unordered) => html.push("<ul>".to_string()),
        Some(List::Ordered) => html.push("<ol>".to_string()),
        None => {}
    }
    *open = want;
}

fn ordered_item(line: &str) -> Option<&str> {
    let re = ORDERED_ITEM.as_ref()?;
    re.find(line).map(|m| &line[m.end()..])
}

fn inline(text: &str) -> String {
    let escaped = html_escape(text);
    match BOLD.as_ref() {
        Some(re) => re.replace_all(&escaped, "<strong>$1</strong>").into_owned(),
        None => escaped,
    }
}

fn tags(items: &[String]) -> String {
    items
        .iter()
        .map(|i| format!(r#"<span class="tag">{}</span>"#, html_escape(i)))
        .collect::<String>()
}

/// Render the complete report as one self-contained HTML page.
///
/// Diagrams are rendered client-side by Mermaid.
pub fn render_html(report: &HandoverReport) -> String {
    let context = &report.context;
    let analysis = &context.analysis;
    let mut body = String::new();

    let _ = write!(
        body,
        r##"<header>
<h1>Project Handover Report</h1>
<p class="meta">Generated {} from {} recordings in <code>{}</code></p>
<nav><a href="#executive">Executive</a><a href="#technical">Technical</a><a href="#overview">Overview</a><a href="#diagrams">Diagrams</a><a href="#people">People</a><a href="#timeline">Timeline</a><a href="#meetings">Meetings</a></nav>
</header>
"##,
        report.generated_at.format("%B %d, %Y at %H:%M"),
        report.videos.len(),
        html_escape(&report.video_directory.display().to_string()),
    );

    let _ = write!(
        body,
        "<section id=\"executive\">\n<h2>Executive Summary</h2>\n{}\n</section>\n",
        markdown_to_html(&report.executive_summary)
    );
    let _ = write!(
        body,
        "<section id=\"technical\">\n<h2>Technical Summary</h2>\n{}\n</section>\n",
        markdown_to_html(&report.technical_summary)
    );

    let _ = write!(
        body,
        "<section id=\"overview\">\n<h2>Project Overview</h2>\n{}\n",
        markdown_to_html(&analysis.project_overview)
    );
    if !analysis.key_themes.is_empty() {
        let _ = write!(body, "<h3>Key Themes</h3>\n<p>{}</p>\n", tags(&analysis.key_themes));
    }
    if !analysis.technical_stack.is_empty() {
        let _ = write!(
            body,
            "<h3>Technical Stack</h3>\n<p>{}</p>\n",
            tags(&analysis.technical_stack)
        );
    }
    for (title, items) in [
        ("Decisions", &analysis.decisions),
        ("Risks", &analysis.risks),
        ("Open Questions", &analysis.open_questions),
    ] {
        if !items.is_empty() {
            let list: String = items
                .iter()
                .map(|i| format!("<li>{}</li>", html_escape(i)))
                .collect();
            let _ = write!(body, "<h3>{}</h3>\n<ul>{}</ul>\n", title, list);
        }
    }
    if !report.synthesis.trim().is_empty() {
        let _ = write!(
            body,
            "<details>\n<summary>Cross-meeting synthesis</summary>\n{}\n</details>\n",
            markdown_to_html(&report.synthesis)
        );
    }
    body.push_str("</section>\n");

    if !report.diagrams.is_empty() {
        body.push_str("<section id=\"diagrams\">\n<h2>Diagrams</h2>\n");
        for diagram in &report.diagrams {
            let _ = write!(
                body,
                "<div class=\"card\">\n<h3>{}</h3>\n<pre class=\"mermaid\">\n{}\n</pre>\n</div>\n",
                html_escape(&diagram.title),
                html_escape(&diagram.code)
            );
        }
        body.push_str("</section>\n");
    }

    if !context.components.is_empty() {
        body.push_str("<section id=\"components\">\n<h2>Components</h2>\n");
        for component in &context.components {
            let _ = write!(
                body,
                "<div class=\"card\">\n<h3>{}</h3>\n<p>{}</p>\n<p>{}</p>\n</div>\n",
                html_escape(&component.name),
                html_escape(&component.description),
                tags(&component.technologies)
            );
        }
        body.push_str("</section>\n");
    }

    if !context.people.is_empty() {
        body.push_str(
            "<section id=\"people\">\n<h2>People &amp; Roles</h2>\n<table>\n<tr><th>Name</th><th>Roles</th><th>Works on</th></tr>\n",
        );
        for person in &context.people {
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&person.name),
                html_escape(&person.roles.join(", ")),
                html_escape(&person.components.join(", "))
            );
        }
        body.push_str("</table>\n</section>\n");
    }

    if !context.timeline.is_empty() {
        body.push_str(
            "<section id=\"timeline\">\n<h2>Timeline</h2>\n<table>\n<tr><th>Date</th><th>Type</th><th>Event</th></tr>\n",
        );
        for event in &context.timeline {
            let date = event
                .date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "TBD".to_string());
            let _ = writeln!(
                body,
                "<tr><td>{}</td><td>{}</td><td><strong>{}</strong><br>{}</td></tr>",
                date,
                html_escape(&event.event_type),
                html_escape(&event.title),
                html_escape(&event.description)
            );
        }
        body.push_str("</table>\n</section>\n");
    }

    body.push_str("<section id=\"meetings\">\n<h2>Meeting Summaries</h2>\n");
    for video in &report.videos {
        let _ = write!(
            body,
            "<details class=\"card\">\n<summary>{} ({})</summary>\n",
            html_escape(&video.name),
            video.date_label("Unknown date")
        );
        match &video.error {
            Some(error) => {
                let _ = writeln!(
                    body,
                    "<p class=\"error\">Error processing this recording: {}</p>",
                    html_escape(error)
                );
            }
            None => {
                let _ = writeln!(body, "{}", markdown_to_html(&video.summary));
            }
        }
        body.push_str("</details>\n");
    }
    body.push_str("</section>\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Project Handover Report</title>
<style>{}</style>
<script src="{}"></script>
</head>
<body>
{}<script>mermaid.initialize({{ startOnLoad: true, securityLevel: "strict" }});</script>
</body>
</html>
"#,
        STYLE, MERMAID_CDN, body
    )
}

/// Write the HTML report to `path`, creating parent directories.
pub fn write_html(report: &HandoverReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_html(report))?;
    Ok(())
}

/// Write the executive, technical and synthesis summaries as Markdown files.
pub fn export_markdown(report: &HandoverReport, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let files = [
        ("executive_summary.md", "Executive Handover Summary", &report.executive_summary),
        ("technical_summary.md", "Technical Handover Summary", &report.technical_summary),
        ("synthesis.md", "Cross-Meeting Synthesis", &report.synthesis),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (file_name, heading, content) in files {
        let path = dir.join(file_name);
        std::fs::write(&path, format!("# {}\n\n{}\n", heading, content.trim()))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handover::models::{Diagram, ProjectContext, VideoSummary};
    use chrono::Local;
    use tempfile::TempDir;

    fn report() -> HandoverReport {
        HandoverReport {
            video_directory: "/meetings".into(),
            generated_at: Local::now(),
            videos: vec![
                VideoSummary {
                    name: "kickoff".into(),
                    source: "/meetings/kickoff.mp4".into(),
                    date: None,
                    summary: "## Overview\n\nWe <agreed>.".into(),
                    duration_seconds: None,
                    error: None,
                },
                VideoSummary {
                    name: "broken".into(),
                    source: "/meetings/broken.mp4".into(),
                    date: None,
                    summary: String::new(),
                    duration_seconds: None,
                    error: Some("ffmpeg exited with 1".into()),
                },
            ],
            synthesis: "## Overview\n\nAll good.".into(),
            context: ProjectContext::default(),
            executive_summary: "**Status**: green".into(),
            technical_summary: "- Rust\n- Postgres".into(),
            diagrams: vec![Diagram {
                name: "roles".into(),
                title: "People & Responsibilities".into(),
                code: "graph LR\n    P0 --> C0".into(),
            }],
        }
    }

    #[test]
    fn test_markdown_to_html() {
        let html = markdown_to_html(
            "# Title\n### Sub\nSome **bold** <b>text</b>\n- one\n- two\n\n1. first\n2. second\nafter",
        );

        assert_eq!(
            html,
            "<h3>Title</h3>\n<h4>Sub</h4>\n<p>Some <strong>bold</strong> &lt;b&gt;text&lt;/b&gt;</p>\n\
             <ul>\n<li>one</li>\n<li>two</li>\n</ul>\n\
             <ol>\n<li>first</li>\n<li>second</li>\n</ol>\n<p>after</p>"
        );
    }

    #[test]
    fn test_list_switch_closes_previous_list() {
        let html = markdown_to_html("- a\n1. b");
        assert_eq!(html, "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_render_html_is_self_contained_and_escaped() {
        let html = render_html(&report());

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(MERMAID_CDN));
        assert!(html.contains("<pre class=\"mermaid\">\ngraph LR\n    P0 --&gt; C0\n</pre>"));
        assert!(html.contains("<strong>Status</strong>: green"));
        assert!(html.contains("We &lt;agreed&gt;."));
        assert!(html.contains("Error processing this recording: ffmpeg exited with 1"));
        assert!(html.contains("2 recordings"));
    }

    #[test]
    fn test_export_markdown() {
        let dir = TempDir::new().unwrap();
        let written = export_markdown(&report(), &dir.path().join("md")).unwrap();

        assert_eq!(written.len(), 3);
        let executive = std::fs::read_to_string(dir.path().join("md/executive_summary.md")).unwrap();
        assert_eq!(executive, "# Executive Handover Summary\n\n**Status**: green\n");
        let synthesis = std::fs::read_to_string(dir.path().join("md/synthesis.md")).unwrap();
        assert!(synthesis.starts_with("# Cross-Meeting Synthesis"));
    }
}
