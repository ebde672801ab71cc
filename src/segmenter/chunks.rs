use serde::{Deserialize, Serialize};
use tracing::info;

use crate::transcript::TranscriptSegment;

/// A token-budgeted span of consecutive segments, sized for one generation
/// request. Consecutive chunks overlap by roughly `overlap_tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Concatenated segment text
    pub text: String,
    /// Start time of the first segment in seconds
    pub start: f64,
    /// End time of the last fully-consumed segment in seconds
    pub end: f64,
    /// Strictly increasing indices into the original segment array
    pub segment_indices: Vec<usize>,
}

/// Rough token cost of a text: one token per four characters, minimum one.
pub fn estimate_tokens(text: &str) -> usize {
    ((text.len() + 3) / 4).max(1)
}

/// Split the transcript into token-budgeted chunks. When a chunk closes, the
/// next one is seeded by walking backward through the closed chunk's segments
/// until `overlap_tokens` is reached, so consecutive chunks share context.
pub fn chunk_transcript(
    segments: &[TranscriptSegment],
    max_tokens: usize,
    overlap_tokens: usize,
) -> Vec<Chunk> {
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut indices: Vec<usize> = Vec::new();
    let mut current_tokens = 0usize;
    let mut start_ts: Option<f64> = None;
    let mut last_end: Option<f64> = None;

    for (idx, segment) in segments.iter().enumerate() {
        let segment_tokens = estimate_tokens(&segment.text);
        if buffer.is_empty() {
            start_ts = Some(segment.start);
        }

        if current_tokens + segment_tokens > max_tokens && !buffer.is_empty() {
            let end_ts = last_end.unwrap_or(segment.start);
            let prev_indices = std::mem::take(&mut indices);
            chunks.push(Chunk {
                text: buffer.join(" "),
                start: start_ts.unwrap_or(0.0),
                end: end_ts,
                segment_indices: prev_indices.clone(),
            });

            // Seed the next chunk with trailing segments until the overlap
            // budget is met.
            buffer.clear();
            current_tokens = 0;
            let mut step_back_tokens = 0usize;
            for &lookback_idx in prev_indices.iter().rev() {
                let prior = &segments[lookback_idx];
                let prior_tokens = estimate_tokens(&prior.text);
                step_back_tokens += prior_tokens;
                buffer.insert(0, &prior.text);
                indices.insert(0, lookback_idx);
                current_tokens += prior_tokens;
                if step_back_tokens >= overlap_tokens {
                    break;
                }
            }

            start_ts = indices
                .first()
                .map(|&i| segments[i].start)
                .or(Some(segment.start));
        }

        buffer.push(&segment.text);
        indices.push(idx);
        current_tokens += segment_tokens;
        last_end = Some(segment.end());
    }

    if !buffer.is_empty() {
        let start = start_ts.unwrap_or(0.0);
        chunks.push(Chunk {
            text: buffer.join(" "),
            start,
            end: last_end.unwrap_or(start),
            segment_indices: indices,
        });
    }

    info!("Chunked transcript into {} chunks", chunks.len());
    chunks
}

/// Concatenate the text of the given segment indices
pub fn gather_text_for_indices(segments: &[TranscriptSegment], indices: &[usize]) -> String {
    indices
        .iter()
        .filter_map(|&i| segments.get(i).map(|s| s.text.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn make_segments(count: usize, chars_each: usize) -> Vec<TranscriptSegment> {
        (0..count)
            .map(|i| TranscriptSegment::new("x".repeat(chars_each), i as f64 * 10.0, 10.0))
            .collect()
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 1);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(40)), 10);
    }

    #[test]
    fn test_chunk_transcript_single_chunk() {
        let segments = make_segments(3, 8);
        let chunks = chunk_transcript(&segments, 100, 10);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].segment_indices, vec![0, 1, 2]);
        assert_eq!(chunks[0].start, 0.0);
        assert_eq!(chunks[0].end, 30.0);
    }

    #[test]
    fn test_chunk_coverage() {
        // 20 segments of 10 tokens each, budget 35 tokens -> several chunks
        let segments = make_segments(20, 40);
        let chunks = chunk_transcript(&segments, 35, 10);
        assert!(chunks.len() > 1);

        let covered: BTreeSet<usize> = chunks
            .iter()
            .flat_map(|c| c.segment_indices.iter().copied())
            .collect();
        let expected: BTreeSet<usize> = (0..segments.len()).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn test_chunk_overlap() {
        let segments = make_segments(20, 40);
        let chunks = chunk_transcript(&segments, 35, 10);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev: BTreeSet<usize> = pair[0].segment_indices.iter().copied().collect();
            let next: BTreeSet<usize> = pair[1].segment_indices.iter().copied().collect();
            assert!(
                prev.intersection(&next).next().is_some(),
                "consecutive chunks must share at least one segment"
            );
        }
    }

    #[test]
    fn test_chunk_indices_strictly_increasing() {
        let segments = make_segments(20, 40);
        let chunks = chunk_transcript(&segments, 35, 10);
        for chunk in &chunks {
            for pair in chunk.segment_indices.windows(2) {
                assert_eq!(pair[1], pair[0] + 1);
            }
        }
    }

    #[test]
    fn test_chunk_no_overlap_when_zero_overlap_tokens() {
        let segments = make_segments(20, 40);
        let chunks = chunk_transcript(&segments, 35, 0);
        assert!(chunks.len() > 1);
        // With a zero budget the walk-back still takes one segment, so chunks
        // share exactly one index.
        for pair in chunks.windows(2) {
            let prev_last = *pair[0].segment_indices.last().unwrap();
            let next_first = pair[1].segment_indices[0];
            assert_eq!(prev_last, next_first);
        }
    }

    #[test]
    fn test_chunk_empty_input() {
        assert!(chunk_transcript(&[], 100, 10).is_empty());
    }

    #[test]
    fn test_gather_text_for_indices() {
        let segments = vec![
            TranscriptSegment::new("a", 0.0, 1.0),
            TranscriptSegment::new("b", 1.0, 1.0),
            TranscriptSegment::new("c", 2.0, 1.0),
        ];
        assert_eq!(gather_text_for_indices(&segments, &[0, 2]), "a c");
    }
}
