use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::ChunkingConfig;

/// A single timestamped unit of the input transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    /// Raw segment text
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
}

impl TranscriptSegment {
    /// Create a new segment
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }

    /// End time in seconds
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Total transcript duration: end time of the last segment, or 0.0 when empty
pub fn total_duration(segments: &[TranscriptSegment]) -> f64 {
    segments.last().map(|s| s.end()).unwrap_or(0.0)
}

/// Collapse whitespace, drop empty segments, and merge segments separated by
/// small (or negative) gaps into their predecessor.
pub fn normalize_segments(
    segments: &[TranscriptSegment],
    config: &ChunkingConfig,
) -> Vec<TranscriptSegment> {
    let mut normalized: Vec<TranscriptSegment> = Vec::new();

    for segment in segments {
        let text = segment.text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            continue;
        }

        if let Some(prev) = normalized.last_mut() {
            let gap = segment.start - prev.end();
            if gap < 0.0 || (gap > 0.0 && gap <= config.merge_gap_seconds) {
                prev.text = format!("{} {}", prev.text, text);
                prev.duration = segment.end() - prev.start;
                continue;
            }
        }

        normalized.push(TranscriptSegment {
            text,
            start: segment.start,
            duration: segment.duration,
        });
    }

    info!("Normalized transcript to {} segments", normalized.len());
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_end() {
        let seg = TranscriptSegment::new("hello", 10.0, 5.0);
        assert_eq!(seg.end(), 15.0);
    }

    #[test]
    fn test_total_duration() {
        let segments = vec![
            TranscriptSegment::new("a", 0.0, 5.0),
            TranscriptSegment::new("b", 10.0, 5.0),
        ];
        assert_eq!(total_duration(&segments), 15.0);
        assert_eq!(total_duration(&[]), 0.0);
    }

    #[test]
    fn test_normalize_collapses_whitespace_and_drops_empty() {
        let segments = vec![
            TranscriptSegment::new("  hello \t world ", 0.0, 2.0),
            TranscriptSegment::new("   ", 10.0, 2.0),
            TranscriptSegment::new("next", 20.0, 2.0),
        ];
        let normalized = normalize_segments(&segments, &ChunkingConfig::default());
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].text, "hello world");
        assert_eq!(normalized[1].text, "next");
    }

    #[test]
    fn test_normalize_merges_small_gaps() {
        let config = ChunkingConfig {
            merge_gap_seconds: 1.5,
            ..Default::default()
        };
        let segments = vec![
            TranscriptSegment::new("first", 0.0, 2.0),
            TranscriptSegment::new("second", 3.0, 2.0), // gap 1.0 -> merged
            TranscriptSegment::new("third", 10.0, 2.0), // gap 5.0 -> kept
        ];
        let normalized = normalize_segments(&segments, &config);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].text, "first second");
        assert_eq!(normalized[0].start, 0.0);
        assert_eq!(normalized[0].duration, 5.0);
        assert_eq!(normalized[1].text, "third");
    }

    #[test]
    fn test_normalize_merges_overlapping_segments() {
        let segments = vec![
            TranscriptSegment::new("a", 0.0, 5.0),
            TranscriptSegment::new("b", 4.0, 3.0), // negative gap
        ];
        let normalized = normalize_segments(&segments, &ChunkingConfig::default());
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].text, "a b");
        assert_eq!(normalized[0].duration, 7.0);
    }
}
