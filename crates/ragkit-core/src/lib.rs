//! # ragkit-core
//!
//! Core types and traits for ragkit, a Retrieval-Augmented Generation core.
//!
//! This crate provides the foundational abstractions used throughout ragkit:
//!
//! - **Document parsing**: [`DocumentParser`] trait for extracting content
//!   from source files and blobs
//! - **Chunking**: [`Chunker`] trait for splitting text into overlapping,
//!   boundary-aware chunks
//! - **LLM access**: [`LlmProvider`] trait over embedding and chat backends
//! - **Storage**: [`DocumentStore`] trait for persistence plus the vector
//!   and lexical query primitives
//!
//! ## Architecture
//!
//! The crate is organized around an ingestion pipeline and a query path:
//!
//! ```text
//! Source -> DocumentParser -> Chunker -> LlmProvider::embed -> DocumentStore
//!                                                                   |
//!                                    query -> nearest_neighbors -> SearchHit
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Document`] | An ingested source with status and dual metadata |
//! | [`ContentRecord`] | Modality-specific child (text, image, audio) |
//! | [`Embedding`] | A vector derived from one chunk of content |
//! | [`SearchHit`] | A matching chunk with its scoring breakdown |
//!
//! ## Related Crates
//!
//! - `ragkit-extract`: Document parser implementations
//! - `ragkit-chunker`: Chunking strategy implementations
//! - `ragkit-llm`: Provider clients, gateway, and fallbacks
//! - `ragkit-meta`: Schema-constrained metadata generation
//! - `ragkit-store`: In-memory reference `DocumentStore`
//! - `ragkit-jobs`: Background ingestion pipeline
//! - `ragkit-search`: Semantic, hybrid, and faceted search
//! - `ragkit`: Configuration and the client façade

pub mod error;
pub mod traits;
pub mod types;

pub use error::{
    ConfigError, DocumentError, EmbeddingError, Error, GenerationError, ParseError, Result,
    SearchError, StorageError,
};
pub use traits::*;
pub use types::*;
