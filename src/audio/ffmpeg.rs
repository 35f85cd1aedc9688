//! ffmpeg and ffprobe wrappers.

use crate::error::{DebriefError, Result};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// Run an external tool to completion, mapping a missing binary to
/// [`DebriefError::ToolNotFound`].
async fn run_tool(command: &mut Command, tool: &str) -> Result<Output> {
    command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DebriefError::ToolNotFound(tool.to_string())
            } else {
                DebriefError::ToolFailed(format!("{} execution failed: {}", tool, e))
            }
        })
}

/// Extract the audio track of `source` into a compact mono MP3 in `output_dir`.
///
/// Works for audio and video inputs alike.
#[instrument(skip(output_dir), fields(source = %source.display()))]
pub async fn extract_audio(source: &Path, output_dir: &Path) -> Result<PathBuf> {
    if !source.exists() {
        return Err(DebriefError::FileNotFound(source.display().to_string()));
    }
    std::fs::create_dir_all(output_dir)?;

    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    let target = output_dir.join(format!("{}.mp3", stem));

    info!("Extracting audio to {}", target.display());

    let output = run_tool(
        Command::new("ffmpeg")
            .arg("-i").arg(source)
            .arg("-vn")
            .arg("-ac").arg("1")
            .arg("-ar").arg("16000")
            .arg("-codec:a").arg("libmp3lame")
            .arg("-b:a").arg("64k")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(&target),
        "ffmpeg",
    )
    .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DebriefError::Audio(format!("ffmpeg audio extraction failed: {}", stderr.trim())));
    }

    Ok(target)
}

/// Segments a long audio file into smaller chunks for processing.
///
/// Each chunk will be approximately `chunk_seconds` long. Returns tuples of
/// (chunk_path, offset_seconds) for each segment.
#[instrument(skip_all)]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
) -> Result<Vec<(PathBuf, f64)>> {
    std::fs::create_dir_all(output_dir)?;

    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_len = chunk_seconds.max(1) as f64;

    // Short audio doesn't need splitting
    if total_duration <= chunk_len {
        return Ok(vec![(source.to_path_buf(), 0.0)]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut segments = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let segment_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        let segment_len = chunk_len.min(total_duration - offset);

        extract_segment(source, &segment_path, offset, segment_len).await?;

        debug!("Created segment {} at offset {:.1}s", idx, offset);
        segments.push((segment_path, offset));

        offset += chunk_len;
        idx += 1;
    }

    info!("Created {} audio segments", segments.len());
    Ok(segments)
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // Stream copy first; it is lossless and fast
    let copied = run_tool(
        Command::new("ffmpeg")
            .arg("-ss").arg(format!("{:.3}", start))
            .arg("-i").arg(source)
            .arg("-t").arg(format!("{:.3}", length))
            .arg("-c").arg("copy")
            .arg("-y")
            .arg("-loglevel").arg("warning")
            .arg(dest),
        "ffmpeg",
    )
    .await?;

    if copied.status.success() && dest.exists() {
        return Ok(());
    }

    warn!("Stream copy failed, re-encoding segment");

    let encoded = run_tool(
        Command::new("ffmpeg")
            .arg("-ss").arg(format!("{:.3}", start))
            .arg("-i").arg(source)
            .arg("-t").arg(format!("{:.3}", length))
            .arg("-codec:a").arg("libmp3lame")
            .arg("-qscale:a").arg("2")
            .arg("-y")
            .arg("-loglevel").arg("error")
            .arg(dest),
        "ffmpeg",
    )
    .await?;

    if encoded.status.success() {
        Ok(())
    } else {
        let err = String::from_utf8_lossy(&encoded.stderr);
        Err(DebriefError::Audio(format!("Segment extraction failed: {}", err.trim())))
    }
}

/// Queries the duration of a media file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let output = run_tool(
        Command::new("ffprobe")
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg(path),
        "ffprobe",
    )
    .await?;

    if !output.status.success() {
        return Err(DebriefError::Audio(format!(
            "ffprobe could not read {}",
            path.display()
        )));
    }

    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(json: &str) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_str(json)
        .map_err(|_| DebriefError::Audio("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| DebriefError::Audio("Could not determine audio duration".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_duration() {
        let json = r#"{"format": {"filename": "a.mp3", "duration": "1834.512000"}}"#;
        assert!((parse_probe_duration(json).unwrap() - 1834.512).abs() < 1e-9);
    }

    #[test]
    fn test_parse_probe_duration_missing() {
        assert!(parse_probe_duration(r#"{"format": {}}"#).is_err());
        assert!(parse_probe_duration("not json").is_err());
    }

    #[tokio::test]
    async fn test_extract_audio_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_audio(&dir.path().join("missing.mp4"), dir.path()).await;
        assert!(matches!(result, Err(DebriefError::FileNotFound(_))));
    }
}
