pub mod chunks;
pub mod windows;

pub use chunks::{chunk_transcript, estimate_tokens, gather_text_for_indices, Chunk};
pub use windows::{build_windows, super_chunks, Window};
