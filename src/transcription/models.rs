//! Data models for transcription.

use serde::{Deserialize, Serialize};

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Identifier of the source media, usually the file stem.
    pub media_id: String,
    /// Individual transcript segments with timestamps, ordered by start.
    pub segments: Vec<TranscriptSegment>,
    /// Full transcript text (space-joined segments).
    pub full_text: String,
    /// Total duration in seconds.
    pub duration_seconds: f64,
}

impl Transcript {
    /// Create a new transcript from segments.
    pub fn new(media_id: String, segments: Vec<TranscriptSegment>) -> Self {
        let full_text = segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);

        Self {
            media_id,
            segments,
            full_text,
            duration_seconds,
        }
    }

    /// Wrap plain text that has no timing information.
    ///
    /// The text is kept verbatim and carried by a single zero-length segment.
    pub fn from_text(media_id: String, text: String) -> Self {
        let segments = if text.trim().is_empty() {
            Vec::new()
        } else {
            vec![TranscriptSegment::new(0.0, 0.0, text.trim().to_string())]
        };

        Self {
            media_id,
            segments,
            full_text: text,
            duration_seconds: 0.0,
        }
    }

    /// Rebuild a transcript from cached text and segments.
    pub fn from_parts(media_id: String, full_text: String, segments: Vec<TranscriptSegment>) -> Self {
        let duration_seconds = segments.last().map(|s| s.end_seconds).unwrap_or(0.0);
        Self {
            media_id,
            segments,
            full_text,
            duration_seconds,
        }
    }

    /// One `[start s -> end s] text` line per segment.
    pub fn segment_lines(&self) -> String {
        self.segments
            .iter()
            .map(|s| format!("{}\n", s.to_line()))
            .collect()
    }
}

/// A single segment of a transcript with timestamp information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Transcribed text content.
    pub text: String,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    ///
    /// Times are clamped so that `0 <= start_seconds <= end_seconds`.
    pub fn new(start_seconds: f64, end_seconds: f64, text: String) -> Self {
        let start_seconds = start_seconds.max(0.0);
        Self {
            start_seconds,
            end_seconds: end_seconds.max(start_seconds),
            text,
        }
    }

    /// Render as `[0.00s -> 5.20s] text`.
    pub fn to_line(&self) -> String {
        format!("[{:.2}s -> {:.2}s] {}", self.start_seconds, self.end_seconds, self.text)
    }

    /// Parse a line written by [`TranscriptSegment::to_line`].
    pub fn parse_line(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix('[')?;
        let (times, text) = rest.split_once("] ")?;
        let (start, end) = times.split_once(" -> ")?;
        let start = start.trim().strip_suffix('s')?.parse().ok()?;
        let end = end.trim().strip_suffix('s')?.parse().ok()?;
        Some(Self::new(start, end, text.to_string()))
    }
}

/// Parse segment lines, skipping blank or malformed ones.
pub fn parse_segment_lines(content: &str) -> Vec<TranscriptSegment> {
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(TranscriptSegment::parse_line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_creation() {
        let segments = vec![
            TranscriptSegment::new(0.0, 5.0, "Hello world".to_string()),
            TranscriptSegment::new(5.0, 10.0, "This is a test".to_string()),
        ];

        let transcript = Transcript::new("standup".to_string(), segments);

        assert_eq!(transcript.media_id, "standup");
        assert_eq!(transcript.full_text, "Hello world This is a test");
        assert_eq!(transcript.duration_seconds, 10.0);
    }

    #[test]
    fn test_segment_times_are_clamped() {
        let negative = TranscriptSegment::new(-1.5, 3.0, "a".to_string());
        assert_eq!((negative.start_seconds, negative.end_seconds), (0.0, 3.0));

        let reversed = TranscriptSegment::new(8.0, 6.5, "b".to_string());
        assert_eq!((reversed.start_seconds, reversed.end_seconds), (8.0, 8.0));

        let parsed = TranscriptSegment::parse_line("[4.00s -> 2.00s] late").unwrap();
        assert_eq!(parsed.end_seconds, 4.0);
    }

    #[test]
    fn test_segment_line() {
        let segment = TranscriptSegment::new(0.0, 5.2, "We agreed on Postgres.".to_string());
        assert_eq!(segment.to_line(), "[0.00s -> 5.20s] We agreed on Postgres.");
        assert_eq!(TranscriptSegment::parse_line(&segment.to_line()), Some(segment));
    }

    #[test]
    fn test_parse_segment_lines_skips_garbage() {
        let content = "[0.00s -> 1.50s] one\n\nnot a segment\n[1.50s -> 3.00s] two ] words\n[x -> 1s] bad\n";
        let segments = parse_segment_lines(content);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text, "two ] words");
        assert_eq!(segments[1].start_seconds, 1.5);
    }

    #[test]
    fn test_from_text() {
        let transcript = Transcript::from_text("notes".into(), "Plain notes.\n".into());
        assert_eq!(transcript.full_text, "Plain notes.\n");
        assert_eq!(transcript.segments.len(), 1);

        assert!(Transcript::from_text("empty".into(), "  ".into()).segments.is_empty());
    }
}
