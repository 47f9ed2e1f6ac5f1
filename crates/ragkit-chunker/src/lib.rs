//! # ragkit-chunker
//!
//! Chunking strategies for ragkit.
//!
//! Splitting extracted text into overlapping, boundary-aware chunks is the
//! step between parsing and embedding. Three strategies are provided:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SlidingChunker`] | Character window with backward break-point search |
//! | [`StructureChunker`] | Paragraph-accumulating, splits oversized paragraphs |
//! | [`CodeChunker`] | Prefers function/class/block boundaries |
//!
//! All strategies implement [`ragkit_core::Chunker`] and guarantee forward
//! progress even when `overlap >= chunk_size`. [`ChunkerRegistry`] selects
//! a strategy by name with a configurable default.

pub mod code;
pub mod registry;
pub mod sliding;
pub mod structure;

pub use code::CodeChunker;
pub use registry::ChunkerRegistry;
pub use sliding::SlidingChunker;
pub use structure::StructureChunker;
