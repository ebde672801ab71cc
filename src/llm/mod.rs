pub mod embeddings;
pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{EmbeddingConfig, GenerationConfig};

/// Chat message for text generation requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Per-request generation options; `None` falls back to the provider's configured value
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub max_tokens: Option<i32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl GenerationOptions {
    /// Deterministic sampling (temperature 0)
    pub fn deterministic() -> Self {
        Self {
            temperature: Some(0.0),
            ..Default::default()
        }
    }
}

/// Text generation capability: ordered role/content messages in, text out.
/// Transport and provider errors propagate; the core performs no retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Result<String>;
}

/// Embedding capability: one fixed-length vector per input string, same order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Create a text generator backed by an OpenAI-compatible chat endpoint
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn TextGenerator>> {
    Ok(Box::new(providers::ChatCompletionsProvider::new(
        config.clone(),
    )?))
}

/// Create an embedder backed by an OpenAI-compatible embeddings endpoint
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    Ok(Box::new(embeddings::EmbeddingsProvider::new(
        config.clone(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = ChatMessage::system("be brief");
        assert_eq!(msg.role, "system");
        assert_eq!(msg.content, "be brief");

        let msg = ChatMessage::user("hello");
        assert_eq!(msg.role, "user");
    }

    #[test]
    fn test_deterministic_options() {
        let opts = GenerationOptions::deterministic();
        assert_eq!(opts.temperature, Some(0.0));
        assert!(opts.max_tokens.is_none());
    }
}
