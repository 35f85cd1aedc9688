//! Character-window chunking of transcript text.

use crate::error::{DebriefError, Result};
use serde::{Deserialize, Serialize};

/// A trailing fragment shorter than `chunk_size / TAIL_DIVISOR` characters
/// is folded into the preceding chunk.
const TAIL_DIVISOR: usize = 4;

/// A contiguous window of the transcript text.
///
/// Offsets are in characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position in the chunk sequence (0-based).
    pub index: usize,
    /// First character covered.
    pub start: usize,
    /// One past the last character covered.
    pub end: usize,
    /// Characters at the head of this chunk that repeat the previous chunk's tail.
    pub overlap: usize,
    pub text: String,
}

impl TextChunk {
    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The part of this chunk not shared with its predecessor.
    pub fn fresh_text(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((byte, _)) => &self.text[byte..],
            None => "",
        }
    }
}

/// Split `text` into overlapping windows of `chunk_size` characters.
///
/// Consecutive chunks share exactly `chunk_overlap` characters. Every chunk
/// but the last is exactly `chunk_size` long; the last absorbs a short
/// trailing fragment and may be longer. Text that fits in one window comes
/// back as a single chunk. Empty text yields no chunks.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<TextChunk>> {
    if chunk_size == 0 {
        return Err(DebriefError::Config("chunk_size must be positive".into()));
    }
    if chunk_overlap >= chunk_size {
        return Err(DebriefError::Config(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            chunk_overlap, chunk_size
        )));
    }

    // Byte offset of every char boundary, plus the end of the string
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = boundaries.len() - 1;

    if total == 0 {
        return Ok(Vec::new());
    }

    let stride = chunk_size - chunk_overlap;
    let min_tail = chunk_size / TAIL_DIVISOR;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let mut end = (start + chunk_size).min(total);
        if total - end < min_tail {
            end = total;
        }

        chunks.push(TextChunk {
            index: chunks.len(),
            start,
            end,
            overlap: if start == 0 { 0 } else { chunk_overlap },
            text: text[boundaries[start]..boundaries[end]].to_string(),
        });

        if end == total {
            break;
        }
        start += stride;
    }

    Ok(chunks)
}
