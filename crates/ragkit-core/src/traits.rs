//! Core traits for ragkit components.
//!
//! This module defines the seams between the pipeline stages:
//!
//! - [`DocumentParser`]: Map a source file or byte blob to extracted content
//! - [`Chunker`]: Split text into overlapping, boundary-aware chunks
//! - [`LlmProvider`]: Uniform interface over embedding and chat backends
//! - [`DocumentStore`]: Persist documents, content records, and embeddings,
//!   and expose the vector/lexical query primitives
//!
//! These traits enable a pluggable architecture where different
//! implementations can be swapped without changing the rest of the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::error::{EmbeddingError, GenerationError, ParseError, StorageError};
use crate::types::{
    ChatMessage, ChatOptions, ChunkParams, ContentRecord, Document, DocumentStatus, Embedding,
    LexicalHit, ListOptions, Neighbor, ParsedDocument, SearchFilters, StoreStats,
};

// ============================================================================
// Parsing
// ============================================================================

/// Trait for parsing source documents into extracted content.
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// File extensions this parser handles (lowercase, no dot).
    fn supported_extensions(&self) -> &[&str];

    /// MIME types this parser handles.
    fn supported_types(&self) -> &[&str];

    /// Check if this parser can handle the given file.
    fn can_parse(&self, path: &Path, mime_type: &str) -> bool {
        self.supported_types().contains(&mime_type)
            || path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| {
                    self.supported_extensions()
                        .contains(&ext.to_ascii_lowercase().as_str())
                })
    }

    /// Parse a file from disk.
    async fn parse(&self, path: &Path) -> Result<ParsedDocument, ParseError>;

    /// Parse from an in-memory blob; `name` carries the original file name
    /// for extension-based decisions.
    async fn parse_bytes(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError>;
}

// ============================================================================
// Chunking
// ============================================================================

/// Trait for splitting text into chunks.
///
/// Chunking is CPU-bound and never suspends, so the trait is synchronous.
pub trait Chunker: Send + Sync {
    /// Name of this chunking strategy.
    fn name(&self) -> &str;

    /// Split `text` into ordered chunks. Empty text yields an empty
    /// sequence; text shorter than the window yields one trimmed chunk.
    fn chunk(&self, text: &str, params: &ChunkParams) -> Vec<String>;
}

// ============================================================================
// LLM providers
// ============================================================================

/// Uniform interface over embedding and chat completion backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name used in logs and `"provider/model"` overrides.
    fn name(&self) -> &str;

    /// Produce one embedding vector per input, in input order.
    async fn embed(
        &self,
        model: &str,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Run a chat completion and return the assistant text.
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, GenerationError>;
}

// ============================================================================
// Storage
// ============================================================================

/// Trait for the storage layer: transactional CRUD plus the vector and
/// lexical query primitives the search engine builds on.
///
/// Implementations must enforce `(content_kind, content_id, chunk_index)`
/// uniqueness and cascade deletes from documents through content records
/// to embeddings.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ---- documents ----

    async fn insert_document(&self, document: &Document) -> Result<(), StorageError>;

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StorageError>;

    /// Replace a document row; refreshes `updated_at`.
    async fn update_document(&self, document: &Document) -> Result<(), StorageError>;

    /// Update only the status field.
    async fn set_status(&self, id: Uuid, status: DocumentStatus) -> Result<(), StorageError>;

    /// Delete a document and cascade to its contents and embeddings.
    /// Returns false if the document did not exist.
    async fn delete_document(&self, id: Uuid) -> Result<bool, StorageError>;

    async fn list_documents(&self, options: &ListOptions) -> Result<Vec<Document>, StorageError>;

    // ---- content records ----

    async fn insert_content(&self, content: &ContentRecord) -> Result<(), StorageError>;

    async fn contents_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ContentRecord>, StorageError>;

    // ---- embeddings ----

    async fn insert_embedding(&self, embedding: &Embedding) -> Result<(), StorageError>;

    async fn embeddings_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<Embedding>, StorageError>;

    /// Approximate nearest neighbors by cosine distance, candidate set
    /// restricted by `filters`, ordered by ascending distance.
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Neighbor>, StorageError>;

    /// Case-insensitive token match across document title and AI-metadata
    /// text fields, ranked by relevance.
    async fn lexical_search(&self, query: &str, limit: usize)
        -> Result<Vec<LexicalHit>, StorageError>;

    /// Increment `usage_count` and set `returned_at` for every listed
    /// embedding as one atomic batch. Returns the number updated.
    async fn record_usage(
        &self,
        embedding_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    // ---- stats ----

    async fn stats(&self) -> Result<StoreStats, StorageError>;
}
