//! Positional metadata codec
//!
//! Each posting stores the positions a word occurs at in its record, packed
//! into a single fixed-size metadata slot as comma-joined decimals. The slot
//! is capped at 255 bytes; longer lists are cut at the last comma boundary
//! that still fits. Truncation is lossy by contract: phrase matches relying
//! on the dropped tail positions silently miss.

use tracing::warn;

/// Name of the metadata field carrying word positions.
pub const OCCURS_FIELD: &str = "_occurs_";

/// Fixed byte budget of a metadata slot in the underlying tree.
pub const OCCURS_BYTE_LIMIT: usize = 255;

/// Encode word positions for storage. `word` and `path` only label the
/// truncation warning.
pub fn encode_occurs(indexes: &[u32], word: &str, path: &str) -> String {
    let joined = indexes
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",");
    if joined.len() <= OCCURS_BYTE_LIMIT {
        return joined;
    }

    // The encoding is pure ASCII, so byte slicing is safe here. Cut at the
    // last comma that keeps the string within budget; the comma itself is
    // dropped so no trailing separator is stored.
    let cut = joined[..=OCCURS_BYTE_LIMIT]
        .rfind(',')
        .unwrap_or(OCCURS_BYTE_LIMIT);
    let kept = joined[..cut].matches(',').count() + 1;
    warn!(
        word,
        path,
        kept,
        total = indexes.len(),
        "word position list exceeds the metadata slot, storing a truncated prefix"
    );
    joined[..cut].to_string()
}

/// Decode a stored position list. An empty string decodes to no positions.
pub fn decode_occurs(encoded: &str) -> Vec<u32> {
    if encoded.is_empty() {
        return Vec::new();
    }
    encoded
        .split(',')
        .filter_map(|part| part.parse().ok())
        .collect()
}
