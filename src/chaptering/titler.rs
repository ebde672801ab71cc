use anyhow::Result;
use tracing::debug;

use crate::chaptering::cluster::Chapter;
use crate::chaptering::paragraphs::StructuredParagraph;
use crate::llm::{ChatMessage, GenerationOptions, TextGenerator};

const TITLE_SYSTEM_PROMPT: &str = "Return a short, descriptive section title. No emojis.";

const DEFAULT_TITLE: &str = "Section";

/// Truncate on a char boundary
fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Ask the generator for a title per chapter and normalize chapter timing so
/// chapters never overlap and are strictly time-ordered.
pub async fn title_chapters(
    chapters: &[Chapter],
    paragraphs: &[StructuredParagraph],
    generator: &dyn TextGenerator,
    title_max_chars: usize,
) -> Result<Vec<Chapter>> {
    let mut titled: Vec<Chapter> = Vec::new();
    let mut previous_end = 0.0f64;

    for chapter in chapters {
        let joined = chapter
            .paragraph_indices
            .iter()
            .filter_map(|&i| paragraphs.get(i).map(|p| p.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n\n");
        let joined = cap_chars(&joined, title_max_chars);

        let messages = vec![
            ChatMessage::system(TITLE_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Provide a 3-6 word title capturing the main idea of the following transcript \
                 paragraphs.\n---\n{}",
                joined
            )),
        ];
        let response = generator
            .generate(messages, GenerationOptions::default())
            .await?;

        let title = response
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        let start = previous_end.max(chapter.start);
        let end = start.max(chapter.end);
        previous_end = end;

        debug!("Titled chapter [{:.0}s - {:.0}s]: {}", start, end, title);

        titled.push(Chapter {
            title: if title.is_empty() {
                DEFAULT_TITLE.to_string()
            } else {
                title
            },
            start,
            end,
            paragraph_indices: chapter.paragraph_indices.clone(),
        });
    }

    Ok(titled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedGenerator {
        responses: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _messages: Vec<ChatMessage>,
            _options: GenerationOptions,
        ) -> Result<String> {
            let mut responses = self.responses.lock().unwrap();
            Ok(if responses.is_empty() {
                String::new()
            } else {
                responses.remove(0)
            })
        }
    }

    fn para(text: &str) -> StructuredParagraph {
        StructuredParagraph {
            text: text.to_string(),
            start: 0.0,
            end: 0.0,
            segment_range: (0, 1),
            chunk_index: 0,
        }
    }

    fn chapter(start: f64, end: f64, indices: Vec<usize>) -> Chapter {
        Chapter {
            title: String::new(),
            start,
            end,
            paragraph_indices: indices,
        }
    }

    #[tokio::test]
    async fn test_titles_take_first_nonempty_line() {
        let generator = ScriptedGenerator {
            responses: Mutex::new(vec!["\n\n  Opening Remarks  \nextra".to_string()]),
        };
        let paragraphs = vec![para("hello")];
        let chapters = vec![chapter(0.0, 10.0, vec![0])];
        let titled = title_chapters(&chapters, &paragraphs, &generator, 4000)
            .await
            .unwrap();
        assert_eq!(titled[0].title, "Opening Remarks");
    }

    #[tokio::test]
    async fn test_empty_response_falls_back_to_default_title() {
        let generator = ScriptedGenerator {
            responses: Mutex::new(vec!["   \n ".to_string()]),
        };
        let paragraphs = vec![para("hello")];
        let chapters = vec![chapter(0.0, 10.0, vec![0])];
        let titled = title_chapters(&chapters, &paragraphs, &generator, 4000)
            .await
            .unwrap();
        assert_eq!(titled[0].title, "Section");
    }

    #[tokio::test]
    async fn test_normalization_removes_overlap() {
        let generator = ScriptedGenerator {
            responses: Mutex::new(vec!["A".to_string(), "B".to_string(), "C".to_string()]),
        };
        let paragraphs = vec![para("p0"), para("p1"), para("p2")];
        // Overlapping and out-of-order spans from a sloppy clustering
        let chapters = vec![
            chapter(0.0, 25.0, vec![0]),
            chapter(20.0, 40.0, vec![1]),
            chapter(35.0, 30.0, vec![2]),
        ];
        let titled = title_chapters(&chapters, &paragraphs, &generator, 4000)
            .await
            .unwrap();

        assert_eq!(titled[0].start, 0.0);
        assert_eq!(titled[0].end, 25.0);
        // Second chapter pushed forward to the first's end
        assert_eq!(titled[1].start, 25.0);
        assert_eq!(titled[1].end, 40.0);
        // Third chapter's end floored at its (pushed) start
        assert_eq!(titled[2].start, 40.0);
        assert_eq!(titled[2].end, 40.0);

        for pair in titled.windows(2) {
            assert!(pair[0].end <= pair[1].start);
        }
    }
}
