use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the transcript chaptering engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Transcript chunking settings
    pub chunking: ChunkingConfig,

    /// Windowing settings for the map-reduce summary sweep
    pub windowing: WindowingConfig,

    /// Chaptering settings (paragraphs, clustering, titling)
    pub chaptering: ChapteringConfig,

    /// Generation endpoint settings
    pub generation: GenerationConfig,

    /// Embedding endpoint settings
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum estimated tokens per chunk
    pub max_tokens: usize,

    /// Estimated tokens carried over between consecutive chunks
    pub overlap_tokens: usize,

    /// Merge a segment into its predecessor when the gap is at most this many seconds
    pub merge_gap_seconds: f64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1800,
            overlap_tokens: 200,
            merge_gap_seconds: 1.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowingConfig {
    /// Window length in seconds
    pub window_len_seconds: u32,

    /// Stride between window starts in seconds
    pub stride_seconds: u32,

    /// Number of consecutive windows merged into one super-chunk
    pub superchunk_size: usize,

    /// Character cap applied to super-chunk text in summary prompts
    pub map_max_chars: usize,
}

impl Default for WindowingConfig {
    fn default() -> Self {
        Self {
            window_len_seconds: 180,
            stride_seconds: 30,
            superchunk_size: 5,
            map_max_chars: 40_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapteringConfig {
    /// Cosine similarity threshold for extending the current chapter
    pub sim_threshold: f32,

    /// Character budget for one paragraph-restructuring request
    pub paragraph_max_chars: usize,

    /// Word-prefix sample length used for alignment embeddings
    pub paragraph_sample_words: usize,

    /// Segments searched on either side of a paragraph's provisional span
    pub search_margin: usize,

    /// Dot-product score that short-circuits the alignment search
    pub early_exit_score: f32,

    /// Character cap on the paragraph text sent for titling
    pub title_max_chars: usize,
}

impl Default for ChapteringConfig {
    fn default() -> Self {
        Self {
            sim_threshold: 0.72,
            paragraph_max_chars: 3500,
            paragraph_sample_words: 50,
            search_margin: 3,
            early_exit_score: 0.95,
            title_max_chars: 4000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chat completions endpoint (OpenAI-compatible)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key, if the endpoint requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Maximum tokens per response (-1 lets the server decide)
    pub max_tokens: i32,

    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling parameter
    pub top_p: f32,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: Some("http://127.0.0.1:1234/v1/chat/completions".to_string()),
            api_key: None,
            model: "local-model".to_string(),
            max_tokens: -1,
            temperature: 0.2,
            top_p: 0.95,
            timeout_seconds: 1800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embeddings endpoint (OpenAI-compatible)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// API key, if the endpoint requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Embedding model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: Some("http://127.0.0.1:1234/v1/embeddings".to_string()),
            api_key: None,
            model: "text-embedding-qwen3-0.6b".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            windowing: WindowingConfig::default(),
            chaptering: ChapteringConfig::default(),
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path.as_ref(), content).await?;
        Ok(())
    }
}
