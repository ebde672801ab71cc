use super::Embedder;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;

/// Embedder backed by an OpenAI-compatible /v1/embeddings endpoint
pub struct EmbeddingsProvider {
    config: EmbeddingConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

impl EmbeddingsProvider {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Embedder for EmbeddingsProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = self
            .config
            .endpoint
            .as_ref()
            .ok_or_else(|| anyhow!("Embeddings endpoint not configured"))?;

        let request = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };

        debug!("Embedding {} texts via {}", texts.len(), endpoint);

        let mut builder = self.client.post(endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Embeddings API error {}: {}", status, text));
        }

        let parsed: EmbeddingsResponse = response.json().await?;

        if parsed.data.len() != texts.len() {
            return Err(anyhow!(
                "Embeddings response returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            ));
        }

        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}
