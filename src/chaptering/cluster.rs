use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::chaptering::paragraphs::StructuredParagraph;
use crate::llm::Embedder;

/// A maximal run of similar consecutive paragraphs, time-bounded and titled
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Chapter title; empty until titling
    pub title: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Contiguous indices into the paragraph array
    pub paragraph_indices: Vec<usize>,
}

/// Cosine similarity of two vectors; 0.0 when either norm is zero
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom == 0.0 {
        return 0.0;
    }
    dot / denom
}

/// One embedding vector per paragraph, in paragraph order
pub async fn embed_paragraphs(
    paragraphs: &[StructuredParagraph],
    embedder: &dyn Embedder,
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = paragraphs.iter().map(|p| p.text.clone()).collect();
    embedder.embed(&texts).await
}

/// Group adjacent paragraphs into chapters with a single linear pass.
/// A paragraph extends the current chapter when its similarity to the
/// previous paragraph is at or above the threshold; otherwise it starts a
/// new chapter. Chapters stay contiguous in paragraph order.
pub fn cluster_paragraphs(
    vectors: &[Vec<f32>],
    paragraphs: &[StructuredParagraph],
    sim_threshold: f32,
) -> Vec<Chapter> {
    let mut chapters: Vec<Chapter> = Vec::new();
    if paragraphs.is_empty() {
        return chapters;
    }

    let mut current = Chapter {
        title: String::new(),
        start: paragraphs[0].start,
        end: paragraphs[0].end,
        paragraph_indices: vec![0],
    };

    for idx in 1..paragraphs.len() {
        let sim = cosine_similarity(&vectors[idx - 1], &vectors[idx]);
        if sim >= sim_threshold {
            current.end = current.end.max(paragraphs[idx].end);
            current.paragraph_indices.push(idx);
        } else {
            chapters.push(current);
            current = Chapter {
                title: String::new(),
                start: paragraphs[idx].start,
                end: paragraphs[idx].end,
                paragraph_indices: vec![idx],
            };
        }
    }
    chapters.push(current);
    chapters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(start: f64, end: f64) -> StructuredParagraph {
        StructuredParagraph {
            text: String::new(),
            start,
            end,
            segment_range: (0, 1),
            chunk_index: 0,
        }
    }

    #[test]
    fn test_cosine_self_similarity_is_one() {
        let v = vec![0.3, -0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_zero_vector_is_zero() {
        let zero = vec![0.0, 0.0];
        let v = vec![1.0, 2.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
    }

    #[test]
    fn test_cosine_orthogonal() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cluster_empty() {
        assert!(cluster_paragraphs(&[], &[], 0.5).is_empty());
    }

    #[test]
    fn test_cluster_single_paragraph() {
        let paragraphs = vec![para(0.0, 10.0)];
        let vectors = vec![vec![1.0, 0.0]];
        let chapters = cluster_paragraphs(&vectors, &paragraphs, 0.5);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].paragraph_indices, vec![0]);
        assert_eq!(chapters[0].start, 0.0);
        assert_eq!(chapters[0].end, 10.0);
    }

    #[test]
    fn test_cluster_splits_on_dissimilar_neighbors() {
        let paragraphs = vec![
            para(0.0, 10.0),
            para(10.0, 20.0),
            para(20.0, 30.0),
            para(30.0, 40.0),
        ];
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];
        let chapters = cluster_paragraphs(&vectors, &paragraphs, 0.6);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].paragraph_indices, vec![0, 1]);
        assert_eq!(chapters[1].paragraph_indices, vec![2, 3]);
        assert_eq!(chapters[0].end, 20.0);
        assert_eq!(chapters[1].start, 20.0);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        // Similarity exactly equal to the threshold must extend the chapter
        let paragraphs = vec![para(0.0, 10.0), para(10.0, 20.0)];
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let chapters = cluster_paragraphs(&vectors, &paragraphs, 1.0);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].paragraph_indices, vec![0, 1]);
    }

    #[test]
    fn test_cluster_end_extends_monotonically() {
        // A later paragraph with an earlier end must not shrink the chapter
        let paragraphs = vec![para(0.0, 30.0), para(10.0, 20.0)];
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        let chapters = cluster_paragraphs(&vectors, &paragraphs, 0.5);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].end, 30.0);
    }
}
