pub mod cluster;
pub mod map_reduce;
pub mod paragraphs;
pub mod pipeline;
pub mod titler;

pub use cluster::{cluster_paragraphs, cosine_similarity, embed_paragraphs, Chapter};
pub use map_reduce::{map_summarize, MiniSummary};
pub use paragraphs::{
    align_paragraphs_with_segments, format_transcript_to_paragraphs, RawParagraph,
    StructuredParagraph,
};
pub use pipeline::generate_chapters;
pub use titler::title_chapters;
