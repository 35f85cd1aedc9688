//! Finding recordings and reading meeting dates from their file names.

use crate::audio::is_video_file;
use crate::error::{DebriefError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Tried in order; the first pattern that yields a valid date wins.
const DATE_PATTERNS: &[&str] = &[
    r"(\d{4})-(\d{2})-(\d{2})[\s_-](\d{2})-(\d{2})-(\d{2})",
    r"(\d{4})-(\d{2})-(\d{2})",
    r"(\d{4})_(\d{2})_(\d{2})",
    r"(\d{4})(\d{2})(\d{2})",
];

static DATE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    DATE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

/// Video files directly inside `dir`, sorted by file name.
pub fn discover_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(DebriefError::InvalidInput(format!(
            "Not a directory: {}",
            dir.display()
        )));
    }

    let mut videos: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_video_file(p))
        .collect();

    videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(videos)
}

/// Extract a meeting date (and time, when present) from a file name.
///
/// Recognizes `YYYY-MM-DD HH-MM-SS` (space, `_` or `-` separated),
/// `YYYY-MM-DD`, `YYYY_MM_DD` and `YYYYMMDD`. Dates without a time are
/// placed at midnight.
pub fn extract_date(file_name: &str) -> Option<NaiveDateTime> {
    DATE_REGEXES.iter().find_map(|re| {
        let caps = re.captures(file_name)?;
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

        let date = NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?)?;
        if caps.len() == 7 {
            date.and_hms_opt(num(4)?, num(5)?, num(6)?)
        } else {
            date.and_hms_opt(0, 0, 0)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(DATE_REGEXES.len(), DATE_PATTERNS.len());
    }

    #[test]
    fn test_extract_date_formats() {
        assert_eq!(
            extract_date("2025-10-27 10-30-00.mp4"),
            Some(ymd_hms(2025, 10, 27, 10, 30, 0))
        );
        assert_eq!(
            extract_date("standup_2025-10-27_09-15-30.mkv"),
            Some(ymd_hms(2025, 10, 27, 9, 15, 30))
        );
        assert_eq!(extract_date("review-2025-10-27.mov"), Some(ymd_hms(2025, 10, 27, 0, 0, 0)));
        assert_eq!(extract_date("2025_01_02 planning.mp4"), Some(ymd_hms(2025, 1, 2, 0, 0, 0)));
        assert_eq!(extract_date("call20240229.webm"), Some(ymd_hms(2024, 2, 29, 0, 0, 0)));
    }

    #[test]
    fn test_extract_date_rejects_invalid_values() {
        assert_eq!(extract_date("meeting.mp4"), None);
        assert_eq!(extract_date("2025-13-40.mp4"), None);
        // Invalid time falls through to the date-only pattern
        assert_eq!(
            extract_date("2025-03-04_25-99-99.mp4"),
            Some(ymd_hms(2025, 3, 4, 0, 0, 0))
        );
    }

    #[test]
    fn test_discover_videos_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["b.mp4", "a.MOV", "notes.txt", "c.mkv", "audio.mp3"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let videos = discover_videos(dir.path()).unwrap();
        let names: Vec<_> = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.MOV", "b.mp4", "c.mkv"]);
    }

    #[test]
    fn test_discover_videos_requires_directory() {
        let dir = TempDir::new().unwrap();
        assert!(discover_videos(&dir.path().join("missing")).is_err());
    }
}
