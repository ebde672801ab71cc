use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::chaptering::{generate_chapters, Chapter, StructuredParagraph};
use crate::config::ChapteringConfig;
use crate::llm::{ChatMessage, Embedder, GenerationOptions, TextGenerator};
use crate::segmenter::Chunk;
use crate::transcript::TranscriptSegment;

const OUTLINE_SYSTEM_PROMPT: &str = "You are an expert technical writer producing rigorous, \
detailed lecture notes. Ensure all content is grounded strictly in the provided transcript \
excerpts. Do not use emojis in any output.";

const OUTLINE_INSTRUCTION: &str = "Given the transcript context, produce a structured outline of \
topics with concise summaries. Provide for each topic: a descriptive title and a 1-2 sentence \
summary.";

const SUMMARY_TRIM_CHARS: usize = 220;
const PREVIEW_CHARS: usize = 400;

/// A coarse outline topic, used when chaptering fails or as a chapter digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineTopic {
    pub title: String,
    pub summary: String,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub segment_indices: Option<Vec<usize>>,
}

#[derive(Debug, Deserialize)]
struct OutlineEntry {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
}

/// Truncate on a char boundary
fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn format_chunk_preview(chunks: &[Chunk], limit: usize) -> String {
    chunks
        .iter()
        .take(limit)
        .enumerate()
        .map(|(idx, chunk)| format!("Chunk {}: {}", idx + 1, cap_chars(&chunk.text, PREVIEW_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate a coarse outline from a few chunk previews. Unparsable responses
/// are recovered as a single "Full Session" topic holding the raw text.
pub async fn generate_outline(
    chunks: &[Chunk],
    generator: &dyn TextGenerator,
    sample_chunk_count: usize,
) -> Result<Vec<OutlineTopic>> {
    let preview = format_chunk_preview(chunks, sample_chunk_count);

    let messages = vec![
        ChatMessage::system(OUTLINE_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Transcript sample:\n{}\n\n{}\nOutput as JSON array with objects: \
             {{title, summary, start?, end?}}.",
            preview, OUTLINE_INSTRUCTION
        )),
    ];

    let response = generator
        .generate(messages, GenerationOptions::default())
        .await?;

    match serde_json::from_str::<Vec<OutlineEntry>>(&response) {
        Ok(entries) => Ok(entries
            .into_iter()
            .map(|entry| OutlineTopic {
                title: entry.title.unwrap_or_else(|| "Untitled".to_string()),
                summary: entry.summary.unwrap_or_default(),
                start: entry.start,
                end: entry.end,
                segment_indices: None,
            })
            .collect()),
        Err(err) => {
            warn!("Outline JSON parse failed, keeping raw response: {}", err);
            Ok(vec![OutlineTopic {
                title: "Full Session".to_string(),
                summary: response,
                start: None,
                end: None,
                segment_indices: None,
            }])
        }
    }
}

fn trim_summary(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SUMMARY_TRIM_CHARS {
        return text.to_string();
    }
    format!("{}...", cap_chars(text, SUMMARY_TRIM_CHARS).trim_end())
}

/// Convert titled chapters into outline topics, pulling each chapter's
/// paragraph text and the union of its segment indices.
pub fn topics_from_chapters(
    chapters: &[Chapter],
    paragraphs: &[StructuredParagraph],
) -> Vec<OutlineTopic> {
    chapters
        .iter()
        .enumerate()
        .map(|(idx, chapter)| {
            let mut fragments: Vec<&str> = Vec::new();
            let mut segment_indices: BTreeSet<usize> = BTreeSet::new();
            for &p_idx in &chapter.paragraph_indices {
                if let Some(para) = paragraphs.get(p_idx) {
                    fragments.push(&para.text);
                    segment_indices.extend(para.segment_range.0..para.segment_range.1);
                }
            }
            let combined = fragments.join(" ");
            let fallback_title = format!("Chapter {}", idx + 1);
            let title = if chapter.title.is_empty() {
                fallback_title
            } else {
                chapter.title.clone()
            };
            let summary = {
                let trimmed = trim_summary(&combined);
                if trimmed.is_empty() {
                    title.clone()
                } else {
                    trimmed
                }
            };
            OutlineTopic {
                title,
                summary,
                start: Some(chapter.start),
                end: Some(chapter.end),
                segment_indices: if segment_indices.is_empty() {
                    None
                } else {
                    Some(segment_indices.into_iter().collect())
                },
            }
        })
        .collect()
}

/// Thin orchestration: attempt the full chaptering pass, falling back to the
/// coarse outline-only path when chaptering fails or yields nothing.
pub async fn chapters_or_outline(
    segments: &[TranscriptSegment],
    chunks: &[Chunk],
    generator: &dyn TextGenerator,
    embedder: &dyn Embedder,
    config: &ChapteringConfig,
    sample_chunk_count: usize,
) -> Result<(Vec<OutlineTopic>, Vec<Chapter>, Vec<StructuredParagraph>)> {
    let (chapters, paragraphs) =
        match generate_chapters(segments, generator, embedder, config).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Chapter generation failed; falling back to LLM outline: {}", err);
                (Vec::new(), Vec::new())
            }
        };

    if chapters.is_empty() {
        let outline = generate_outline(chunks, generator, sample_chunk_count).await?;
        return Ok((outline, Vec::new(), Vec::new()));
    }

    let outline = topics_from_chapters(&chapters, &paragraphs);
    Ok((outline, chapters, paragraphs))
}
