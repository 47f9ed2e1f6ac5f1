//! Core types for ragkit.
//!
//! This module contains the shared data structures used across ragkit:
//!
//! ## Documents
//! - [`Document`]: An ingested source with its metadata and lifecycle status
//! - [`DocumentType`]: Media-type classification driving parsing and schemas
//! - [`DocumentStatus`]: Pipeline state of a document
//!
//! ## Content records
//! - [`TextContent`] / [`ImageContent`] / [`AudioContent`]: Modality-specific
//!   children of a document
//! - [`ContentRecord`]: Tagged union over the three modalities
//! - [`ContentKind`]: Discriminant used as the embeddable type tag
//!
//! ## Embeddings
//! - [`Embedding`]: A fixed-dimension vector derived from a chunk of content
//!
//! ## Chunking
//! - [`ChunkParams`]: Window size and overlap with default coercion
//!
//! ## Search
//! - [`SearchOptions`] / [`SearchFilters`] / [`FacetFilters`]: Query knobs
//! - [`SearchHit`]: A matching chunk with its scores
//! - [`Neighbor`] / [`LexicalHit`]: Store-level candidate shapes
//!
//! ## LLM
//! - [`ChatMessage`] / [`ChatOptions`]: Provider-neutral chat request shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON metadata bag used for both AI-derived and file-derived metadata.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Documents
// ============================================================================

/// An ingested source document.
///
/// `metadata` holds AI-derived fields (summary, keywords, classification, …)
/// and `file_metadata` holds system-derived facts (size, MIME type,
/// dimensions, page count, …). The two namespaces are disjoint: writes to
/// one never touch the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier
    pub id: Uuid,
    /// Origin URI or path
    pub location: String,
    /// Display title
    pub title: String,
    /// Media-type classification
    pub document_type: DocumentType,
    /// Pipeline status
    pub status: DocumentStatus,
    /// AI-derived metadata, schema-tagged by `document_type`
    pub metadata: Metadata,
    /// System-derived file metadata
    pub file_metadata: Metadata,
    /// Raw source bytes, kept for formats parsed by background jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_blob: Option<Vec<u8>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a pending document with empty metadata maps.
    pub fn new(location: impl Into<String>, title: impl Into<String>, document_type: DocumentType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            location: location.into(),
            title: title.into(),
            document_type,
            status: DocumentStatus::Pending,
            metadata: Metadata::new(),
            file_metadata: Metadata::new(),
            file_blob: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Media-type classification of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Text,
    Image,
    Audio,
    Pdf,
    Docx,
    Html,
    Markdown,
    Mixed,
}

impl DocumentType {
    /// Classify by file extension; unknown extensions default to text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "html" | "htm" => Self::Html,
            "md" | "markdown" => Self::Markdown,
            "png" | "jpg" | "jpeg" | "gif" | "webp" => Self::Image,
            "mp3" | "wav" | "m4a" => Self::Audio,
            _ => Self::Text,
        }
    }

    /// Whether content extraction happens locally (as opposed to being
    /// delegated to provider-backed description/transcription).
    pub fn has_local_extraction(self) -> bool {
        !matches!(self, Self::Image | Self::Audio)
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Mixed => "mixed",
        };
        f.write_str(s)
    }
}

/// Pipeline status of a document.
///
/// Transitions only along `pending -> processing -> {processed, error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Processed,
    Error,
}

impl DocumentStatus {
    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Processed)
                | (Self::Processing, Self::Error)
                | (Self::Pending, Self::Error)
        )
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Processed => "processed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Content records
// ============================================================================

/// Discriminant for the embeddable content modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Audio,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        };
        f.write_str(s)
    }
}

/// Extracted text belonging to a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub id: Uuid,
    pub document_id: Uuid,
    /// Full extracted text
    pub content: String,
    /// Model that will embed (or embedded) this content
    pub embedding_model: Option<String>,
    /// Chunk window used when embedding
    pub chunk_size: usize,
    /// Chunk overlap used when embedding
    pub overlap: usize,
    /// Processing parameters and provenance
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Image child of a document; description/alt text are provider-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageContent {
    pub id: Uuid,
    pub document_id: Uuid,
    pub description: Option<String>,
    pub alt_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Audio child of a document; the transcript is provider-derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioContent {
    pub id: Uuid,
    pub document_id: Uuid,
    pub transcript: Option<String>,
    pub duration_secs: Option<f64>,
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Tagged union over the three content modalities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentRecord {
    Text(TextContent),
    Image(ImageContent),
    Audio(AudioContent),
}

impl ContentRecord {
    /// The record's own identifier.
    pub fn id(&self) -> Uuid {
        match self {
            Self::Text(c) => c.id,
            Self::Image(c) => c.id,
            Self::Audio(c) => c.id,
        }
    }

    /// The owning document.
    pub fn document_id(&self) -> Uuid {
        match self {
            Self::Text(c) => c.document_id,
            Self::Image(c) => c.document_id,
            Self::Audio(c) => c.document_id,
        }
    }

    /// Modality discriminant.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Image(_) => ContentKind::Image,
            Self::Audio(_) => ContentKind::Audio,
        }
    }

    /// The text span this record contributes for embedding, if any.
    ///
    /// Text content embeds its extracted text, images embed their
    /// description, audio embeds its transcript.
    pub fn embeddable_text(&self) -> Option<&str> {
        match self {
            Self::Text(c) if !c.content.is_empty() => Some(&c.content),
            Self::Text(_) => None,
            Self::Image(c) => c.description.as_deref().filter(|s| !s.is_empty()),
            Self::Audio(c) => c.transcript.as_deref().filter(|s| !s.is_empty()),
        }
    }
}

// ============================================================================
// Embeddings
// ============================================================================

/// A fixed-dimension vector derived from one chunk of a content record.
///
/// `(content_kind, content_id, chunk_index)` is unique; the store enforces
/// it. `usage_count` and `returned_at` are mutated only by the search
/// engine, as a single batch per search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub id: Uuid,
    /// Modality of the owning content record
    pub content_kind: ContentKind,
    /// Owning content record
    pub content_id: Uuid,
    /// Position of the chunk within the content, 0-based and contiguous
    pub chunk_index: u32,
    /// The embedded text span, stored for re-display
    pub content: String,
    /// The embedding vector
    pub vector: Vec<f32>,
    /// Model that produced the vector
    pub embedding_model: String,
    /// Times this embedding was returned by a search
    pub usage_count: u64,
    /// Last time this embedding was returned by a search
    pub returned_at: Option<DateTime<Utc>>,
    /// Processing parameters (chunk size, overlap, …)
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Chunking
// ============================================================================

/// Default chunk window in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 200;

/// Window size and overlap for the chunker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkParams {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkParams {
    /// Build params, coercing a zero chunk size to the defaults.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        if chunk_size == 0 {
            Self::default()
        } else {
            Self {
                chunk_size,
                overlap,
            }
        }
    }
}

impl Default for ChunkParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Output of the document parser.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Extracted content; inner whitespace is preserved, callers normalize
    pub content: String,
    /// Media-type classification determined during dispatch
    pub document_type: DocumentType,
    /// System-derived file metadata
    pub file_metadata: Metadata,
    /// Title extracted from document properties, if any
    pub title: Option<String>,
}

// ============================================================================
// Search
// ============================================================================

/// Source of a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Semantic,
    Lexical,
}

/// Filters restricting the nearest-neighbor candidate set.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub document_type: Option<DocumentType>,
    pub classification: Option<String>,
    pub tags: Vec<String>,
    pub embedding_model: Option<String>,
    pub document_id: Option<Uuid>,
}

impl SearchFilters {
    /// True when no filter is set.
    pub fn is_empty(&self) -> bool {
        self.document_type.is_none()
            && self.classification.is_none()
            && self.tags.is_empty()
            && self.embedding_model.is_none()
            && self.document_id.is_none()
    }
}

/// Options for a search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Maximum results to return
    pub limit: usize,
    /// Minimum similarity to keep a candidate; engine default when None
    pub similarity_threshold: Option<f32>,
    /// Candidate filters
    pub filters: SearchFilters,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            similarity_threshold: None,
            filters: SearchFilters::default(),
        }
    }
}

/// Facet filters for faceted search.
#[derive(Debug, Clone, Default)]
pub struct FacetFilters {
    /// AND-of-substring matches against `metadata.keywords`
    pub keywords: Vec<String>,
    /// Exact classification match
    pub classification: Option<String>,
    /// Array-contains matches against `metadata.tags`
    pub tags: Vec<String>,
    /// Inclusive lower bound on `created_at`
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
}

/// Slim document reference carried on store-level candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: Uuid,
    pub title: String,
    pub location: String,
}

/// A nearest-neighbor candidate returned by the store.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub embedding: Embedding,
    /// Cosine distance to the query vector
    pub distance: f32,
    pub document: DocumentRef,
}

/// A lexical (full-text) candidate returned by the store.
#[derive(Debug, Clone)]
pub struct LexicalHit {
    pub document: DocumentRef,
    /// Engine-provided text relevance, higher is better
    pub relevance: f32,
    /// Field content that matched, for display
    pub snippet: String,
}

/// A search result with its scoring breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matching embedding (absent for purely lexical hits)
    pub embedding_id: Option<Uuid>,
    /// The embedded span or matched snippet
    pub content: String,
    pub document_id: Uuid,
    pub document_title: String,
    pub document_location: String,
    pub chunk_index: Option<u32>,
    /// `1 - distance` for semantic hits
    pub similarity: f32,
    /// Cosine distance for semantic hits
    pub distance: f32,
    /// Usage-derived score added to similarity for ranking
    pub usage_score: f32,
    /// Final ranking key
    pub combined_score: f32,
    /// Sources that produced this hit
    pub search_types: Vec<SearchType>,
    /// Embedding metadata for semantic hits
    pub metadata: Metadata,
}

// ============================================================================
// Store shapes
// ============================================================================

/// Options for listing documents.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Store-wide statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_documents: u64,
    pub pending_documents: u64,
    pub processing_documents: u64,
    pub processed_documents: u64,
    pub error_documents: u64,
    pub total_contents: u64,
    pub total_embeddings: u64,
}

// ============================================================================
// LLM request shapes
// ============================================================================

/// A chat message in a provider-neutral shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user`, or `assistant`
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Options for a chat completion call.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub max_tokens: usize,
    pub temperature: f32,
    /// Ask the provider for a strict-JSON response where supported
    pub json: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.2,
            json: false,
        }
    }
}
