//! Mermaid diagrams for the handover report.

use super::models::{
    Diagram, PersonRole, ProjectComponent, ProjectContext, TimelineEvent, VideoSummary,
};
use chrono::NaiveDate;

const MAX_LABEL_CHARS: usize = 60;
/// A decision-flow diagram is only drawn from this many decisions on.
const MIN_DECISIONS: usize = 3;
const MAX_FLOW_DECISIONS: usize = 8;
const MAX_UNDATED_EVENTS: usize = 10;

/// Build every diagram the context has data for.
pub fn generate_all(context: &ProjectContext, videos: &[VideoSummary]) -> Vec<Diagram> {
    let mut diagrams = Vec::new();

    if !context.timeline.is_empty() || videos.iter().any(|v| v.date.is_some()) {
        diagrams.push(Diagram {
            name: "timeline".into(),
            title: "Project Timeline".into(),
            code: timeline(&context.timeline, videos),
        });
    }

    if !context.components.is_empty() {
        diagrams.push(Diagram {
            name: "architecture".into(),
            title: "System Architecture".into(),
            code: architecture(&context.components),
        });
    }

    if !context.people.is_empty() {
        diagrams.push(Diagram {
            name: "roles".into(),
            title: "People & Responsibilities".into(),
            code: roles(&context.people),
        });
    }

    if context.analysis.decisions.len() >= MIN_DECISIONS {
        diagrams.push(Diagram {
            name: "decisions".into(),
            title: "Decision Flow".into(),
            code: decision_flow(&context.analysis.decisions, &context.timeline),
        });
    }

    diagrams
}

/// Gantt chart of dated meetings and events, one section per event type.
pub fn timeline(events: &[TimelineEvent], videos: &[VideoSummary]) -> String {
    let mut items: Vec<(NaiveDate, String, String)> = videos
        .iter()
        .filter_map(|v| {
            v.date
                .map(|d| (d.date(), format!("Meeting {}", v.name), "meeting".to_string()))
        })
        .chain(events.iter().filter_map(|e| {
            e.date
                .map(|d| (d, e.title.clone(), e.event_type.clone()))
        }))
        .collect();
    items.sort_by_key(|(date, _, _)| *date);

    if items.is_empty() {
        let mut lines = vec!["gantt".to_string(), "    title Project Events".to_string()];
        for (i, event) in events.iter().take(MAX_UNDATED_EVENTS).enumerate() {
            lines.push(format!("    Event {}: {}", i + 1, sanitize(&event.title)));
        }
        return lines.join("\n");
    }

    // Sections appear in order of their earliest item
    let mut sections: Vec<(String, Vec<(NaiveDate, String)>)> = Vec::new();
    for (date, title, kind) in items {
        let kind = if kind.trim().is_empty() {
            "other".to_string()
        } else {
            kind.trim().to_lowercase()
        };
        match sections.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, entries)) => entries.push((date, title)),
            None => sections.push((kind, vec![(date, title)])),
        }
    }

    let mut lines = vec![
        "gantt".to_string(),
        "    title Project Timeline".to_string(),
        "    dateFormat YYYY-MM-DD".to_string(),
    ];
    for (kind, entries) in sections {
        lines.push(String::new());
        lines.push(format!("    section {}s", capitalize(&kind)));
        for (date, title) in entries {
            let title: String = title.chars().take(50).collect();
            lines.push(format!(
                "    {}: {}, 1d",
                or_default(sanitize(&title), "Event"),
                date.format("%Y-%m-%d")
            ));
        }
    }

    lines.join("\n")
}

/// Component graph; an edge is drawn when a relationship names another component.
pub fn architecture(components: &[ProjectComponent]) -> String {
    let mut lines = vec!["graph TB".to_string()];

    for (i, component) in components.iter().enumerate() {
        let label = or_default(sanitize(&component.name), &format!("Component {}", i + 1));
        lines.push(format!("    C{}[{}]", i, label));
    }

    for (i, component) in components.iter().enumerate() {
        for relationship in &component.relationships {
            let relationship = relationship.to_lowercase();
            let target = components.iter().enumerate().position(|(j, other)| {
                i != j && !other.name.is_empty() && relationship.contains(&other.name.to_lowercase())
            });
            if let Some(j) = target {
                lines.push(format!("    C{} --> C{}", i, j));
            }
        }
    }

    lines.join("\n")
}

/// People linked to the components they work on.
pub fn roles(people: &[PersonRole]) -> String {
    let mut lines = vec!["graph LR".to_string()];
    let mut component_ids: Vec<&str> = Vec::new();

    for (i, person) in people.iter().enumerate() {
        let label = or_default(sanitize(&person.name), &format!("Person {}", i + 1));
        lines.push(format!("    P{}[{}]", i, label));
    }

    for person in people {
        for component in &person.components {
            if !component_ids.contains(&component.as_str()) {
                let idx = component_ids.len();
                let label = or_default(sanitize(component), &format!("Component {}", idx + 1));
                lines.push(format!("    C{}[{}]", idx, label));
                component_ids.push(component);
            }
        }
    }

    for (i, person) in people.iter().enumerate() {
        for component in &person.components {
            if let Some(idx) = component_ids.iter().position(|c| *c == component.as_str()) {
                lines.push(format!("    P{} --> C{}", i, idx));
            }
        }
    }

    lines.join("\n")
}

/// Linear flow from project start through each decision.
///
/// Decision events from the timeline are preferred over the plain decision
/// list, which is capped at eight entries.
pub fn decision_flow(decisions: &[String], timeline: &[TimelineEvent]) -> String {
    let from_timeline: Vec<String> = timeline
        .iter()
        .filter(|e| e.event_type.eq_ignore_ascii_case("decision"))
        .map(|e| e.title.chars().take(40).collect())
        .collect();

    let steps = if from_timeline.is_empty() {
        decisions.iter().take(MAX_FLOW_DECISIONS).cloned().collect()
    } else {
        from_timeline
    };

    let mut lines = vec!["flowchart TD".to_string()];
    if steps.is_empty() {
        lines.push("    Start[Project Started]".to_string());
        return lines.join("\n");
    }

    lines.push("    Start([Project Start])".to_string());
    for (i, step) in steps.iter().enumerate() {
        let label = or_default(sanitize(step), &format!("Decision {}", i + 1));
        lines.push(format!("    D{}[{}]", i, label));
        if i == 0 {
            lines.push("    Start --> D0".to_string());
        } else {
            lines.push(format!("    D{} --> D{}", i - 1, i));
        }
    }
    lines.push(format!("    D{} --> End([Current State])", steps.len() - 1));

    lines.join("\n")
}

/// Make `text` safe as a Mermaid node label.
pub fn sanitize(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter_map(|c| match c {
            '"' | '\'' | '`' | '#' | '(' | ')' | '[' | ']' | '{' | '}' => None,
            ';' => Some(','),
            ':' => Some('-'),
            '\n' | '\r' => Some(' '),
            c => Some(c),
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > MAX_LABEL_CHARS {
        let head: String = collapsed.chars().take(MAX_LABEL_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        collapsed
    }
}

fn or_default(label: String, default: &str) -> String {
    if label.is_empty() {
        default.to_string()
    } else {
        label
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handover::models::ProjectAnalysis;

    fn video(name: &str, date: Option<&str>) -> VideoSummary {
        VideoSummary {
            name: name.into(),
            source: format!("{}.mp4", name).into(),
            date: date.and_then(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
            summary: "s".into(),
            duration_seconds: None,
            error: None,
        }
    }

    fn event(date: Option<&str>, title: &str, kind: &str) -> TimelineEvent {
        TimelineEvent {
            date: date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            title: title.into(),
            description: String::new(),
            event_type: kind.into(),
        }
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Use \"Kafka\" (v3): yes; [maybe]"), "Use Kafka v3- yes, maybe");
        assert_eq!(sanitize("  a\n\n  b  "), "a b");
        let long = "x".repeat(100);
        let label = sanitize(&long);
        assert_eq!(label.chars().count(), 60);
        assert!(label.ends_with("..."));
    }

    #[test]
    fn test_timeline_sections_in_date_order() {
        let code = timeline(
            &[
                event(Some("2024-03-10"), "Chose: Postgres", "decision"),
                event(None, "Undated", "issue"),
            ],
            &[video("kickoff", Some("2024-03-01"))],
        );

        assert!(code.starts_with("gantt\n    title Project Timeline\n    dateFormat YYYY-MM-DD"));
        let meetings = code.find("section Meetings").unwrap();
        let decisions = code.find("section Decisions").unwrap();
        assert!(meetings < decisions);
        assert!(code.contains("    Meeting kickoff: 2024-03-01, 1d"));
        assert!(code.contains("    Chose- Postgres: 2024-03-10, 1d"));
        assert!(!code.contains("Undated"));
    }

    #[test]
    fn test_timeline_without_dates_lists_events() {
        let code = timeline(&[event(None, "Kickoff", "milestone")], &[video("a", None)]);
        assert_eq!(code, "gantt\n    title Project Events\n    Event 1: Kickoff");
    }

    #[test]
    fn test_architecture_edges_by_name() {
        let components = vec![
            ProjectComponent {
                name: "Web App".into(),
                relationships: vec!["Calls the billing api for invoices".into()],
                ..Default::default()
            },
            ProjectComponent {
                name: "Billing API".into(),
                ..Default::default()
            },
            ProjectComponent::default(),
        ];

        let code = architecture(&components);

        assert!(code.contains("    C0[Web App]"));
        assert!(code.contains("    C2[Component 3]"));
        assert!(code.contains("    C0 --> C1"));
        assert_eq!(code.matches("-->").count(), 1);
    }

    #[test]
    fn test_roles_share_component_nodes() {
        let people = vec![
            PersonRole {
                name: "Ana".into(),
                components: vec!["Billing".into()],
                ..Default::default()
            },
            PersonRole {
                name: "Bo".into(),
                components: vec!["Billing".into(), "Search".into()],
                ..Default::default()
            },
        ];

        let code = roles(&people);

        assert_eq!(code.matches("[Billing]").count(), 1);
        assert!(code.contains("    C1[Search]"));
        assert!(code.contains("    P0 --> C0"));
        assert!(code.contains("    P1 --> C0"));
        assert!(code.contains("    P1 --> C1"));
    }

    #[test]
    fn test_decision_flow_prefers_timeline_decisions() {
        let decisions: Vec<String> = (1..=10).map(|i| format!("Decision text {}", i)).collect();

        let plain = decision_flow(&decisions, &[]);
        assert!(plain.contains("    Start --> D0"));
        assert!(plain.contains("    D7 --> End([Current State])"));
        assert!(!plain.contains("D8["));

        let timeline = vec![event(Some("2024-01-01"), "Adopt Rust", "decision")];
        let from_events = decision_flow(&decisions, &timeline);
        assert!(from_events.contains("    D0[Adopt Rust]"));
        assert!(from_events.contains("    D0 --> End([Current State])"));
    }

    #[test]
    fn test_generate_all_respects_thresholds() {
        let mut context = ProjectContext {
            analysis: ProjectAnalysis {
                decisions: vec!["a".into(), "b".into()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(generate_all(&context, &[video("x", None)]).is_empty());

        context.analysis.decisions.push("c".into());
        let names: Vec<_> = generate_all(&context, &[video("x", Some("2024-01-02"))])
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["timeline", "decisions"]);
    }
}
