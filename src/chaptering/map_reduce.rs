use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{ChatMessage, GenerationOptions, TextGenerator};
use crate::segmenter::Window;

/// Independent per-window summary produced by the map pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiniSummary {
    /// Topic sentence for the window
    pub topic: String,
    /// `[start, end]` of the window in seconds, enforced from the input
    pub when: [f64; 2],
    /// Up to 4 short bullet points
    pub bullets: Vec<String>,
    /// Up to 5 keyword tokens
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MiniSummaryPayload {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    bullets: Vec<serde_json::Value>,
    #[serde(default)]
    keywords: Vec<serde_json::Value>,
}

fn strings_only(values: Vec<serde_json::Value>, cap: usize) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .take(cap)
        .collect()
}

/// Truncate on a char boundary
fn cap_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn summary_prompt(window: &Window, max_chars: usize) -> String {
    format!(
        "You are given a transcript excerpt and its time window in seconds. \
         Summarize this window in 1-2 sentences, and return JSON with keys: \
         topic (string), when [start,end] (numbers), bullets (array of 2-4 short points), \
         keywords (array of up to 5 tokens). Use the provided start and end seconds exactly.\n\n\
         start: {}\nend: {}\n\ntranscript:\n{}\nReturn only JSON.",
        window.start,
        window.end,
        cap_chars(&window.text, max_chars)
    )
}

/// Summarize each super-chunk independently. Unparsable generator output is
/// recovered as an empty record; capability failures propagate.
pub async fn map_summarize(
    superchunks: &[Window],
    generator: &dyn TextGenerator,
    max_chars: usize,
) -> Result<Vec<MiniSummary>> {
    let mut out: Vec<MiniSummary> = Vec::new();

    for window in superchunks {
        let messages = vec![
            ChatMessage::system("You output strict JSON only."),
            ChatMessage::user(summary_prompt(window, max_chars)),
        ];
        let response = generator
            .generate(messages, GenerationOptions::default())
            .await?;

        let summary = match serde_json::from_str::<MiniSummaryPayload>(&response) {
            Ok(payload) => MiniSummary {
                topic: payload.topic,
                when: [window.start, window.end],
                bullets: strings_only(payload.bullets, 4),
                keywords: strings_only(payload.keywords, 5),
            },
            Err(err) => {
                warn!("Mini-summary JSON parse failed, using empty record: {}", err);
                MiniSummary {
                    topic: String::new(),
                    when: [window.start, window.end],
                    bullets: Vec::new(),
                    keywords: Vec::new(),
                }
            }
        };
        out.push(summary);
    }

    Ok(out)
}
