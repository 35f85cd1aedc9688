//! Audio extraction and splitting via ffmpeg/ffprobe.

mod ffmpeg;

pub use ffmpeg::{extract_audio, probe_duration, split_audio};

use std::path::Path;

/// Supported audio file extensions.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "flac", "aac", "ogg", "opus", "m4a", "wma", "aiff",
];

/// Supported video file extensions (audio will be extracted).
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm", "m4v", "flv"];

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Check if path is a supported audio file.
pub fn is_audio_file(path: &Path) -> bool {
    has_extension(path, AUDIO_EXTENSIONS)
}

/// Check if path is a supported video file.
pub fn is_video_file(path: &Path) -> bool {
    has_extension(path, VIDEO_EXTENSIONS)
}

/// Check if path is a supported media file (audio or video).
pub fn is_media_file(path: &Path) -> bool {
    is_audio_file(path) || is_video_file(path)
}
