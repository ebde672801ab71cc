/// Chapterize - Transcript Chaptering Engine
///
/// Partitions a time-stamped transcript into topically coherent, non-overlapping
/// chapters. Combines token-budgeted chunking, LLM-driven paragraph restructuring
/// with embedding-based realignment, and adjacent-similarity clustering.

pub mod config;
pub mod logging;
pub mod transcript;
pub mod llm;
pub mod segmenter;
pub mod chaptering;
pub mod outline;

// Re-export main types for easy access
pub use crate::config::Config;
pub use crate::transcript::{normalize_segments, total_duration, TranscriptSegment};
pub use crate::llm::{ChatMessage, Embedder, GenerationOptions, TextGenerator};
pub use crate::segmenter::{build_windows, chunk_transcript, super_chunks, Chunk, Window};
pub use crate::chaptering::{generate_chapters, Chapter, StructuredParagraph};
pub use crate::outline::{chapters_or_outline, generate_outline, OutlineTopic};
