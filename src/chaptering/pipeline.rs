use anyhow::Result;
use tracing::info;

use crate::chaptering::cluster::{cluster_paragraphs, embed_paragraphs, Chapter};
use crate::chaptering::paragraphs::{
    align_paragraphs_with_segments, format_transcript_to_paragraphs, StructuredParagraph,
};
use crate::chaptering::titler::title_chapters;
use crate::config::ChapteringConfig;
use crate::llm::{Embedder, TextGenerator};
use crate::transcript::{total_duration, TranscriptSegment};

/// Run the full chaptering pass: reflow the transcript into paragraphs,
/// realign them to segments, cluster adjacent paragraphs by similarity, and
/// title the resulting chapters. Returns the titled chapters (clipped to the
/// transcript duration) alongside the aligned paragraphs.
pub async fn generate_chapters(
    segments: &[TranscriptSegment],
    generator: &dyn TextGenerator,
    embedder: &dyn Embedder,
    config: &ChapteringConfig,
) -> Result<(Vec<Chapter>, Vec<StructuredParagraph>)> {
    if segments.is_empty() {
        return Ok((Vec::new(), Vec::new()));
    }
    let transcript_end = total_duration(segments);

    let raw_paragraphs = format_transcript_to_paragraphs(segments, generator, config).await?;
    let mut paragraphs =
        align_paragraphs_with_segments(&raw_paragraphs, segments, embedder, config).await?;
    paragraphs.sort_by(|a, b| {
        (a.chunk_index, a.start)
            .partial_cmp(&(b.chunk_index, b.start))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let vectors = embed_paragraphs(&paragraphs, embedder).await?;
    let mut clusters = cluster_paragraphs(&vectors, &paragraphs, config.sim_threshold);
    clusters.sort_by(|a, b| {
        a.start
            .partial_cmp(&b.start)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut titled =
        title_chapters(&clusters, &paragraphs, generator, config.title_max_chars).await?;
    for chapter in &mut titled {
        chapter.end = chapter.end.min(transcript_end);
    }

    info!(
        "Generated {} chapters from {} paragraphs",
        titled.len(),
        paragraphs.len()
    );
    Ok((titled, paragraphs))
}
