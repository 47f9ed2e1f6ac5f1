//! # ragkit-store
//!
//! Storage layer for ragkit.
//!
//! [`MemoryStore`] is the reference implementation of
//! [`ragkit_core::DocumentStore`]: transactional CRUD over documents,
//! content records, and embeddings, brute-force cosine nearest-neighbor
//! search, tokenized lexical search across title and AI-metadata fields,
//! cascade deletes, and the atomic batch usage update the search engine
//! relies on.
//!
//! Production deployments provide their own `DocumentStore` backed by a
//! vector-capable database; the core only requires cosine nearest-neighbor
//! ordering, tokenized full-text search, referential integrity with
//! cascade delete, and atomic batch updates.

pub mod memory;

pub use memory::MemoryStore;
