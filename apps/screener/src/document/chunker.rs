//! Chunker: splits long text into overlapping windows for embedding.
//!
//! Each window is at most `chunk_size` characters. A window ends at the latest
//! natural boundary (paragraph, then line, then word) found in its second half,
//! or is hard-cut at `chunk_size` when none exists. The next window starts exactly
//! `overlap` characters before the previous end, so dropping the first `overlap`
//! characters of every chunk after the first reconstructs the input.

use tracing::debug;

use crate::document::sanitize::sanitize;

/// Chunks whose trimmed length is at or below this are discarded.
const MIN_CHUNK_CHARS: usize = 10;
/// Length of the fallback chunk used when every chunk was discarded.
const FALLBACK_CHUNK_CHARS: usize = 1000;
/// Substituted when the input is empty so indexing never receives an empty set.
pub const EMPTY_PLACEHOLDER: &str = "Resume content";

const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkProfile {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkProfile {
    /// Large windows for narrative retrieval.
    pub const DETAILED: ChunkProfile = ChunkProfile {
        chunk_size: 1000,
        overlap: 200,
    };

    /// Small windows for the per-skill similarity index.
    pub const COMPACT: ChunkProfile = ChunkProfile {
        chunk_size: 500,
        overlap: 50,
    };
}

/// Splits `text` into overlapping windows. Empty input yields no chunks.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    if chars.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = (start + chunk_size).min(chars.len());
        if hard_end == chars.len() {
            chunks.push(chars[start..].iter().collect());
            break;
        }

        // Ending before this point would leave the next window no room to advance.
        let min_end = (start + overlap + 1).max(start + chunk_size / 2);
        let end = find_boundary(&chars, min_end, hard_end).unwrap_or(hard_end);

        chunks.push(chars[start..end].iter().collect());
        start = end - overlap;
    }

    chunks
}

/// Returns the largest `end` in `min_end..=hard_end` that falls right after a separator,
/// trying separators from coarsest to finest.
fn find_boundary(chars: &[char], min_end: usize, hard_end: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|sep| {
        let sep: Vec<char> = sep.chars().collect();
        (min_end.max(sep.len())..=hard_end)
            .rev()
            .find(|&end| chars[end - sep.len()..end] == sep[..])
    })
}

/// Sanitizes, splits, and filters text into chunks ready for indexing.
///
/// Never returns an empty set: if every chunk is too short, the first
/// `FALLBACK_CHUNK_CHARS` sanitized characters (or `EMPTY_PLACEHOLDER`) are used.
pub fn prepare_chunks(text: &str, profile: ChunkProfile) -> Vec<String> {
    let sanitized = sanitize(text);

    let chunks: Vec<String> = split(&sanitized, profile.chunk_size, profile.overlap)
        .into_iter()
        .map(|chunk| sanitize(&chunk))
        .filter(|chunk| chunk.trim().chars().count() > MIN_CHUNK_CHARS)
        .collect();

    if !chunks.is_empty() {
        debug!(
            "Prepared {} chunks (size={}, overlap={})",
            chunks.len(),
            profile.chunk_size,
            profile.overlap
        );
        return chunks;
    }

    if sanitized.trim().is_empty() {
        vec![EMPTY_PLACEHOLDER.to_string()]
    } else {
        vec![sanitized.chars().take(FALLBACK_CHUNK_CHARS).collect()]
    }
}
