//! On-disk cache of pipeline artifacts.
//!
//! Every input file gets three artifacts in the output directory, named
//! after the file stem:
//!
//! - `<stem>_transcript.txt` – the full transcript text
//! - `<stem>_segments.txt` – one `[0.00s -> 5.20s] text` line per segment
//! - `<stem>_summary.md` – the final summary
//!
//! A transcript is only considered cached when both of its files exist.

use crate::error::{DebriefError, Result};
use crate::transcription::{parse_segment_lines, Transcript};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Artifact store rooted at an output directory.
#[derive(Debug, Clone)]
pub struct ResultCache {
    dir: PathBuf,
}

impl ResultCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn transcript_path(&self, source: &Path) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}_transcript.txt", stem(source)?)))
    }

    pub fn segments_path(&self, source: &Path) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}_segments.txt", stem(source)?)))
    }

    pub fn summary_path(&self, source: &Path) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}_summary.md", stem(source)?)))
    }

    /// Load a previously saved transcript, if both of its files exist.
    pub async fn load_transcript(&self, source: &Path) -> Result<Option<Transcript>> {
        let transcript_path = self.transcript_path(source)?;
        let segments_path = self.segments_path(source)?;

        if !fs::try_exists(&transcript_path).await? || !fs::try_exists(&segments_path).await? {
            return Ok(None);
        }

        let text = fs::read_to_string(&transcript_path).await?;
        let segments = parse_segment_lines(&fs::read_to_string(&segments_path).await?);
        debug!("Loaded cached transcript with {} segments", segments.len());

        Ok(Some(Transcript::from_parts(stem(source)?, text, segments)))
    }

    /// Write the transcript text and its segment lines.
    pub async fn save_transcript(&self, source: &Path, transcript: &Transcript) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(self.transcript_path(source)?, &transcript.full_text).await?;
        fs::write(self.segments_path(source)?, transcript.segment_lines()).await?;
        Ok(())
    }

    /// Load a previously saved summary; an empty file counts as missing.
    pub async fn load_summary(&self, source: &Path) -> Result<Option<String>> {
        let path = self.summary_path(source)?;
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    pub async fn save_summary(&self, source: &Path, summary: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.summary_path(source)?;
        fs::write(&path, summary).await?;
        Ok(path)
    }
}

/// File stem used to name artifacts.
pub fn stem(source: &Path) -> Result<String> {
    source
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DebriefError::Cache(format!("No usable file name in {}", source.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcription::TranscriptSegment;
    use tempfile::TempDir;

    fn sample() -> Transcript {
        Transcript::new(
            "retro".into(),
            vec![
                TranscriptSegment::new(0.0, 5.2, "What went well?".into()),
                TranscriptSegment::new(5.2, 9.75, "The deploy pipeline.".into()),
            ],
        )
    }

    #[test]
    fn test_paths_follow_stem() {
        let cache = ResultCache::new("/out");
        let source = Path::new("/videos/retro.mp4");
        assert_eq!(cache.transcript_path(source).unwrap(), Path::new("/out/retro_transcript.txt"));
        assert_eq!(cache.segments_path(source).unwrap(), Path::new("/out/retro_segments.txt"));
        assert_eq!(cache.summary_path(source).unwrap(), Path::new("/out/retro_summary.md"));
    }

    #[tokio::test]
    async fn test_transcript_cache() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path().join("out"));
        let source = Path::new("retro.mp4");

        assert!(cache.load_transcript(source).await.unwrap().is_none());
        cache.save_transcript(source, &sample()).await.unwrap();

        let loaded = cache.load_transcript(source).await.unwrap().unwrap();
        assert_eq!(loaded.full_text, "What went well? The deploy pipeline.");
        assert_eq!(loaded.segments, sample().segments);
        assert_eq!(loaded.media_id, "retro");
    }

    #[tokio::test]
    async fn test_transcript_needs_both_files() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path());
        let source = Path::new("retro.mp4");

        cache.save_transcript(source, &sample()).await.unwrap();
        std::fs::remove_file(cache.segments_path(source).unwrap()).unwrap();

        assert!(cache.load_transcript(source).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_summary_cache() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path());
        let source = Path::new("retro.mp4");

        assert!(cache.load_summary(source).await.unwrap().is_none());
        cache.save_summary(source, "  \n").await.unwrap();
        assert!(cache.load_summary(source).await.unwrap().is_none());

        cache.save_summary(source, "## Overview\n\nGood sprint.").await.unwrap();
        assert_eq!(cache.load_summary(source).await.unwrap().unwrap(), "## Overview\n\nGood sprint.");
    }

    #[test]
    fn test_stem_requires_file_name() {
        assert!(stem(Path::new("/")).is_err());
        assert_eq!(stem(Path::new("a/b/2024-01-05 standup.mkv")).unwrap(), "2024-01-05 standup");
    }
}
