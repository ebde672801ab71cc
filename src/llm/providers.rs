use super::{ChatMessage, GenerationOptions, TextGenerator};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GenerationConfig;

/// Text generator backed by an OpenAI-compatible chat completions endpoint
/// (LM Studio locally, or a hosted service with an API key).
pub struct ChatCompletionsProvider {
    config: GenerationConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: i32,
    temperature: f32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatCompletionsProvider {
    pub fn new(config: GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsProvider {
    async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerationOptions,
    ) -> Result<String> {
        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("Chat completions endpoint not configured"))?;

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: options.temperature.unwrap_or(self.config.temperature),
            top_p: options.top_p.unwrap_or(self.config.top_p),
            stop: options.stop,
        };

        debug!("Sending chat completion request to {}", endpoint);

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Chat completions API error {}: {}", status, text));
        }

        let chat_response: ChatResponse = response.json().await?;

        let content = chat_response
            .choices
            .first()
            .ok_or_else(|| anyhow!("No choices in chat completions response"))?
            .message
            .content
            .trim()
            .to_string();

        Ok(content)
    }
}
