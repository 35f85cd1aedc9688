//! Transcript export formats (TXT, JSON, SRT, VTT).

use super::Transcript;
use crate::error::Result;
use serde::Serialize;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    /// Timestamped segment lines, the same layout as the segment cache.
    Txt,
    Json,
    Srt,
    Vtt,
}

impl OutputFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Txt => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Srt => "srt",
            OutputFormat::Vtt => "vtt",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "txt" | "text" => Ok(OutputFormat::Txt),
            "json" => Ok(OutputFormat::Json),
            "srt" => Ok(OutputFormat::Srt),
            "vtt" | "webvtt" => Ok(OutputFormat::Vtt),
            _ => Err(format!("Unknown format: {}. Use txt, json, srt, or vtt.", s)),
        }
    }
}

/// JSON-serializable transcript for export.
#[derive(Debug, Serialize)]
pub struct TranscriptExport<'a> {
    pub media_id: &'a str,
    pub duration_seconds: f64,
    pub text: &'a str,
    pub segments: Vec<SegmentExport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SegmentExport<'a> {
    pub text: &'a str,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl<'a> From<&'a Transcript> for TranscriptExport<'a> {
    fn from(transcript: &'a Transcript) -> Self {
        Self {
            media_id: &transcript.media_id,
            duration_seconds: transcript.duration_seconds,
            text: &transcript.full_text,
            segments: transcript
                .segments
                .iter()
                .map(|s| SegmentExport {
                    text: &s.text,
                    start_seconds: s.start_seconds,
                    end_seconds: s.end_seconds,
                })
                .collect(),
        }
    }
}

/// Format a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Txt => transcript.segment_lines(),
        OutputFormat::Json => serde_json::to_string_pretty(&TranscriptExport::from(transcript))?,
        OutputFormat::Srt => format_cues(transcript, "", format_srt_timestamp),
        OutputFormat::Vtt => format_cues(transcript, "WEBVTT\n\n", format_vtt_timestamp),
    })
}

/// Numbered cues shared by SRT and WebVTT; only header and timestamp style differ.
fn format_cues(transcript: &Transcript, header: &str, timestamp: fn(f64) -> String) -> String {
    let mut output = String::from(header);

    for (i, segment) in transcript.segments.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            timestamp(segment.start_seconds),
            timestamp(segment.end_seconds)
        ));
        output.push_str(&segment.text);
        output.push_str("\n\n");
    }

    output
}

fn split_millis(seconds: f64) -> (u64, u64, u64, u64) {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    (
        total_ms / 3_600_000,
        (total_ms % 3_600_000) / 60_000,
        (total_ms % 60_000) / 1000,
        total_ms % 1000,
    )
}

/// Format timestamp for SRT (00:00:00,000).
fn format_srt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02},{:03}", h, m, s, ms)
}

/// Format timestamp for VTT (00:00:00.000).
fn format_vtt_timestamp(seconds: f64) -> String {
    let (h, m, s, ms) = split_millis(seconds);
    format!("{:02}:{:02}:{:02}.{:03}", h, m, s, ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptSegment;

    fn sample_transcript() -> Transcript {
        Transcript::new(
            "sprint_review".to_string(),
            vec![
                TranscriptSegment::new(0.0, 2.5, "Welcome everyone.".to_string()),
                TranscriptSegment::new(2.5, 5.0, "Let's start with the demo.".to_string()),
            ],
        )
    }

    #[test]
    fn test_format_txt() {
        let txt = format_transcript(&sample_transcript(), OutputFormat::Txt).unwrap();
        assert_eq!(
            txt,
            "[0.00s -> 2.50s] Welcome everyone.\n[2.50s -> 5.00s] Let's start with the demo.\n"
        );
    }

    #[test]
    fn test_format_json() {
        let json = format_transcript(&sample_transcript(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"media_id\": \"sprint_review\""));
        assert!(json.contains("Welcome everyone."));
    }

    #[test]
    fn test_format_srt() {
        let srt = format_transcript(&sample_transcript(), OutputFormat::Srt).unwrap();
        assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:02,500\nWelcome everyone."));
        assert!(srt.contains("2\n00:00:02,500 --> 00:00:05,000"));
    }

    #[test]
    fn test_format_vtt() {
        let vtt = format_transcript(&sample_transcript(), OutputFormat::Vtt).unwrap();
        assert!(vtt.starts_with("WEBVTT\n\n1\n"));
        assert!(vtt.contains("00:00:00.000 --> 00:00:02.500"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("txt".parse::<OutputFormat>().unwrap(), OutputFormat::Txt);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("webvtt".parse::<OutputFormat>().unwrap(), OutputFormat::Vtt);
        assert!("docx".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_srt_timestamp() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(61.5), "00:01:01,500");
        assert_eq!(format_srt_timestamp(3661.123), "01:01:01,123");
    }
}
