//! # ragkit-search
//!
//! Search engine for ragkit.
//!
//! Semantic retrieval embeds the query, fetches twice the requested limit
//! of cosine nearest-neighbors, drops candidates under the similarity
//! threshold, adds a usage score (frequency + recency of past retrieval)
//! to the similarity, and records a single batch usage update for the
//! returned embeddings.
//!
//! Hybrid search fuses the semantic set with lexical full-text hits under
//! configurable weights, de-duplicating by document. Faceted search
//! restricts candidates by document metadata (keywords, classification,
//! tags, creation date).

pub mod engine;
pub mod scoring;

pub use engine::{QueryInput, SearchConfig, SearchEngine};
pub use scoring::{cosine_similarity, usage_score};
