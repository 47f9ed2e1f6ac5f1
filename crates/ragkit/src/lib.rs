//! # ragkit
//!
//! A Retrieval-Augmented Generation core: ingest documents of several
//! media types, derive vector embeddings for their content, and answer
//! semantic and hybrid queries against the corpus.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use ragkit::{RagClient, RagConfig};
//! use ragkit_core::SearchOptions;
//!
//! # async fn example() -> ragkit_core::Result<()> {
//! let client = RagClient::in_memory(RagConfig::from_env())?;
//!
//! let id = client.add_text("Rust has a borrow checker.", "rust-notes").await?;
//! client.process_document(id).await?;
//!
//! let response = client.search("borrow checker", &SearchOptions::default()).await?;
//! for hit in &response.results {
//!     println!("{:.3}  {}", hit.combined_score, hit.content);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! add_document -> parser -> store(pending) -> extract -> metadata -> embed
//!                                                                     |
//!                    search -> embed(query) -> nearest neighbors -> rerank
//! ```
//!
//! The pipeline runs on a background worker pool with per-document
//! serialization; a search started after a document reaches `processed`
//! observes that document's embeddings. Provider outages degrade to
//! deterministic fallbacks rather than failing ingestion.
//!
//! ## Crates
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `ragkit-core` | Types, traits, errors |
//! | `ragkit-extract` | Document parsers |
//! | `ragkit-chunker` | Chunking strategies |
//! | `ragkit-llm` | Provider gateway and fallbacks |
//! | `ragkit-meta` | Schema-constrained metadata |
//! | `ragkit-store` | In-memory reference store |
//! | `ragkit-jobs` | Ingestion pipeline |
//! | `ragkit-search` | Semantic, hybrid, faceted search |

pub mod client;
pub mod config;

pub use client::{
    AddDocumentResult, ContextChunk, ContextResult, DocumentUpdate, EnhancedPrompt,
    FileIngestResult, RagClient, SearchResponse,
};
pub use config::{init_logging, DatabaseConfig, JobsConfig, LoggingConfig, RagConfig};

pub use ragkit_core as core;
pub use ragkit_search::QueryInput;
