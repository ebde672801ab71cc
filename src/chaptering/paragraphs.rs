use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::config::ChapteringConfig;
use crate::llm::{ChatMessage, Embedder, GenerationOptions, TextGenerator};
use crate::transcript::TranscriptSegment;

const PARAGRAPH_PROMPT: &str = "You are a helpful assistant. Improve readability, add punctuation, \
remove verbal tics, and structure the text into paragraphs separated by blank lines. Keep wording \
faithful. Return the result wrapped in <answer>...</answer>.";

/// A reformatted text block realigned to a contiguous range of transcript segments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredParagraph {
    /// Reflowed paragraph text
    pub text: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Half-open `[lo, hi)` range into the original segments
    pub segment_range: (usize, usize),
    /// Index of the reflow group this paragraph came from
    pub chunk_index: usize,
}

/// A paragraph with a provisional segment span, before embedding realignment
#[derive(Debug, Clone)]
pub struct RawParagraph {
    pub text: String,
    /// Provisional starting segment index
    pub seg_start: usize,
    /// Provisional exclusive end segment index
    pub seg_end: usize,
    pub chunk_index: usize,
}

/// Group segments into character-budgeted spans, skipping empty texts.
/// Returns `(text, start_idx, end_idx)` per group with `end_idx` exclusive.
fn group_segments(
    segments: &[TranscriptSegment],
    max_chars: usize,
) -> Vec<(String, usize, usize)> {
    let mut groups: Vec<(String, usize, usize)> = Vec::new();
    let mut buf = String::new();
    let mut start_idx = 0usize;

    for (idx, seg) in segments.iter().enumerate() {
        let text = seg.text.trim();
        if text.is_empty() {
            continue;
        }
        if buf.is_empty() {
            start_idx = idx;
        }
        let addition_len = text.len() + if buf.is_empty() { 0 } else { 1 };
        if !buf.is_empty() && buf.len() + addition_len > max_chars {
            groups.push((std::mem::take(&mut buf), start_idx, idx));
            buf.push_str(text);
            start_idx = idx;
        } else {
            if !buf.is_empty() {
                buf.push(' ');
            }
            buf.push_str(text);
        }
    }
    if !buf.is_empty() {
        groups.push((buf, start_idx, segments.len()));
    }
    groups
}

fn answer_regex() -> &'static Regex {
    static ANSWER_RE: OnceLock<Regex> = OnceLock::new();
    ANSWER_RE.get_or_init(|| Regex::new(r"(?is)<answer>(.*?)</answer>").unwrap())
}

fn blank_line_regex() -> &'static Regex {
    static BLANK_LINE_RE: OnceLock<Regex> = OnceLock::new();
    BLANK_LINE_RE.get_or_init(|| Regex::new(r"\n\s*\n").unwrap())
}

/// Truncate a string to at most `max_chars` characters on a char boundary
fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ask the generator to restore punctuation and paragraph breaks. Falls back
/// to the raw response when the answer markers are missing.
async fn reflow_text(
    text: &str,
    generator: &dyn TextGenerator,
    max_chars: usize,
) -> Result<String> {
    let messages = vec![
        ChatMessage::system(PARAGRAPH_PROMPT),
        ChatMessage::user(cap_chars(text, max_chars)),
    ];
    let raw = generator
        .generate(messages, GenerationOptions::deterministic())
        .await?;

    if let Some(captures) = answer_regex().captures(&raw) {
        return Ok(captures[1].trim().to_string());
    }
    warn!("Paragraph formatter did not return <answer> tags; using raw content");
    Ok(raw.trim().to_string())
}

/// Split reflowed text into paragraphs on blank lines
fn split_paragraphs(text: &str) -> Vec<String> {
    blank_line_regex()
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Reflow the transcript into paragraphs and assign each one a provisional
/// segment span by dividing its group's span proportionally.
pub async fn format_transcript_to_paragraphs(
    segments: &[TranscriptSegment],
    generator: &dyn TextGenerator,
    config: &ChapteringConfig,
) -> Result<Vec<RawParagraph>> {
    let groups = group_segments(segments, config.paragraph_max_chars);
    let mut structured: Vec<RawParagraph> = Vec::new();

    for (chunk_idx, (group_text, start_idx, end_idx)) in groups.iter().enumerate() {
        let formatted = reflow_text(group_text, generator, config.paragraph_max_chars).await?;
        let paragraphs = split_paragraphs(&formatted);
        if paragraphs.is_empty() {
            continue;
        }

        let seg_indices: Vec<usize> = if *end_idx > *start_idx {
            (*start_idx..*end_idx).collect()
        } else {
            vec![*start_idx]
        };
        let seg_count = seg_indices.len();
        let n_paras = paragraphs.len();

        let boundaries: Vec<usize> = (0..=n_paras).map(|i| (i * seg_count) / n_paras).collect();
        let mut cursor = 0usize;
        for (idx, para) in paragraphs.into_iter().enumerate() {
            let is_last = idx == n_paras - 1;
            let start_off = cursor.max(boundaries[idx]).min(seg_count - 1);

            let mut end_off = if is_last {
                seg_count
            } else {
                boundaries[idx + 1].max(start_off + 1).min(seg_count)
            };
            if end_off <= start_off {
                end_off = (start_off + 1).min(seg_count);
            }

            let slice = &seg_indices[start_off..end_off];
            let seg_start = slice[0];
            let seg_end = if is_last {
                *end_idx
            } else {
                (slice[slice.len() - 1] + 1).min(*end_idx)
            };

            structured.push(RawParagraph {
                text: para,
                seg_start,
                seg_end,
                chunk_index: chunk_idx,
            });

            cursor = cursor.max(end_off);
        }
    }

    debug!("Reflowed transcript into {} paragraphs", structured.len());
    Ok(structured)
}

/// Word-prefix sample of a text, used to keep alignment embeddings cheap
fn word_prefix(text: &str, words: usize) -> String {
    text.split_whitespace()
        .take(words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Locate each paragraph's true starting segment with a bounded embedding
/// search, then derive its time span. `last_consumed` keeps assigned segment
/// ranges monotone and non-overlapping; `prev_end_time` keeps paragraph times
/// non-decreasing.
pub async fn align_paragraphs_with_segments(
    structured: &[RawParagraph],
    segments: &[TranscriptSegment],
    embedder: &dyn Embedder,
    config: &ChapteringConfig,
) -> Result<Vec<StructuredParagraph>> {
    if structured.is_empty() {
        return Ok(Vec::new());
    }
    if segments.is_empty() {
        warn!("No transcript segments available for alignment");
        return Ok(Vec::new());
    }

    let sample_words = config.paragraph_sample_words;
    let para_samples: Vec<String> = structured
        .iter()
        .map(|p| word_prefix(&p.text, sample_words))
        .collect();
    let seg_samples: Vec<String> = segments
        .iter()
        .map(|s| word_prefix(&s.text, sample_words))
        .collect();

    let para_vecs = embedder.embed(&para_samples).await?;
    let seg_vecs = embedder.embed(&seg_samples).await?;
    if seg_vecs.is_empty() {
        warn!("No segment embeddings available for alignment");
        return Ok(Vec::new());
    }

    let n = segments.len();
    let margin = config.search_margin;
    let mut aligned: Vec<StructuredParagraph> = Vec::new();
    let mut last_consumed = 0usize;
    let mut prev_end_time = 0.0f64;

    for (para, para_vec) in structured.iter().zip(para_vecs.iter()) {
        let orig_start = para.seg_start;
        let orig_end = para.seg_end.max(orig_start + 1);

        let start_bound = orig_start
            .saturating_sub(margin)
            .max(last_consumed)
            .min(seg_vecs.len() - 1);
        let end_bound = (orig_end + margin).min(seg_vecs.len()).max(start_bound + 1);

        let mut best_idx = start_bound;
        let mut best_score = f32::NEG_INFINITY;
        for idx in start_bound..end_bound {
            let score: f32 = para_vec
                .iter()
                .zip(seg_vecs[idx].iter())
                .map(|(a, b)| a * b)
                .sum();
            if score > best_score {
                best_score = score;
                best_idx = idx;
            }
            if score >= config.early_exit_score {
                break;
            }
        }

        // Clamp the chosen index into the provisional bounds and keep ranges
        // monotone even when the provisional span lags behind.
        let valid_start = orig_start.min(n - 1);
        let valid_end = orig_end.clamp(valid_start + 1, n);
        let start_idx = best_idx
            .clamp(valid_start, valid_end - 1)
            .max(last_consumed.min(n - 1));

        let span_len = orig_end - orig_start;
        let span_end_idx = (start_idx + span_len - 1).min(n - 1);

        let start_time = prev_end_time.max(segments[start_idx].start);
        let end_time = start_time.max(segments[span_end_idx].end());

        last_consumed = (span_end_idx + 1).max(start_idx + 1);
        prev_end_time = end_time;

        aligned.push(StructuredParagraph {
            text: para.text.clone(),
            start: start_time,
            end: end_time,
            segment_range: (start_idx, span_end_idx + 1),
            chunk_index: para.chunk_index,
        });
    }

    Ok(aligned)
}
