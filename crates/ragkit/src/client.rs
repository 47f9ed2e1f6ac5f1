//! The client façade: ingestion and retrieval use-cases composed over
//! the store, gateway, job runner, and search engine.

use chrono::Utc;
use ragkit_chunker::ChunkerRegistry;
use ragkit_core::{
    ContentRecord, Document, DocumentStatus, DocumentStore, DocumentType, Error, ListOptions,
    Metadata, ParseError, Result, SearchHit, SearchOptions, StoreStats, TextContent,
};
use ragkit_extract::ParserRegistry;
use ragkit_jobs::{JobContext, JobRunner, JobStage};
use ragkit_llm::LlmGateway;
use ragkit_meta::MetadataGenerator;
use ragkit_search::{QueryInput, SearchEngine};
use ragkit_store::MemoryStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::RagConfig;

/// Template used by [`RagClient::enhance_prompt`].
const PROMPT_TEMPLATE: &str = "Use the following context to answer.\n\n\
     Context:\n{{context}}\n\nQuestion:\n{{prompt}}";

/// Separator between chunks in combined context.
const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Extensions skipped by default during directory ingestion.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

// ============================================================================
// Result records
// ============================================================================

/// Outcome of an `add_document` call.
#[derive(Debug, Clone, Serialize)]
pub struct AddDocumentResult {
    pub success: bool,
    pub document_id: Option<Uuid>,
    pub title: Option<String>,
    pub document_type: Option<DocumentType>,
    pub content_length: usize,
    pub embeddings_queued: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddDocumentResult {
    fn failure(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            success: false,
            document_id: None,
            title: None,
            document_type: None,
            content_length: 0,
            embeddings_queued: false,
            message: message.into(),
            error: Some(error.to_string()),
        }
    }
}

/// Per-file outcome of a directory ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct FileIngestResult {
    pub path: PathBuf,
    pub success: bool,
    pub document_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Search response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub total_results: usize,
}

/// One retrieved context chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ContextChunk {
    pub content: String,
    pub source: String,
    pub similarity: f32,
    pub chunk_index: Option<u32>,
}

/// Context assembled for prompt enhancement.
#[derive(Debug, Clone, Serialize)]
pub struct ContextResult {
    pub context_chunks: Vec<ContextChunk>,
    pub combined_context: String,
    pub total_chunks: usize,
}

/// A prompt rendered with retrieved context.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedPrompt {
    pub prompt: String,
    pub context_count: usize,
}

/// Fields a caller may change on an existing document.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    /// Keys merged over the AI metadata; the file namespace is untouched
    pub metadata: Option<Metadata>,
}

// ============================================================================
// Client
// ============================================================================

/// Everything derived from one configuration value.
///
/// Swapped as a unit so every in-flight request keeps a consistent view
/// of configuration, gateway, engine, and runner for its duration.
struct ClientCore {
    config: Arc<RagConfig>,
    gateway: Arc<LlmGateway>,
    engine: SearchEngine,
    runner: Arc<JobRunner>,
    parsers: Arc<ParserRegistry>,
}

/// The ragkit client.
pub struct RagClient {
    store: Arc<dyn DocumentStore>,
    core: RwLock<Arc<ClientCore>>,
}

impl RagClient {
    /// Create a client over the given store.
    pub fn new(config: RagConfig, store: Arc<dyn DocumentStore>) -> Result<Self> {
        let core = build_core(config, &store)?;
        Ok(Self {
            store,
            core: RwLock::new(Arc::new(core)),
        })
    }

    /// Client over an in-memory store, for tests and small corpora.
    pub fn in_memory(config: RagConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemoryStore::new()))
    }

    /// Snapshot of the active core.
    fn core(&self) -> Arc<ClientCore> {
        match self.core.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the configuration atomically. The gateway, search engine,
    /// and job runner are rebuilt from the new value and swapped in as a
    /// unit; requests already running keep the configuration they started
    /// with. Jobs already picked up by the previous runner finish their
    /// current stage against the shared store before its workers stop.
    pub fn configure(&self, config: RagConfig) -> Result<()> {
        let rebuilt = Arc::new(build_core(config, &self.store)?);

        let previous = {
            let mut guard = match self.core.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::replace(&mut *guard, rebuilt)
        };

        previous.runner.shutdown();
        info!("configuration replaced");
        Ok(())
    }

    /// Reset to environment-derived configuration.
    pub fn reset_configuration(&self) -> Result<()> {
        self.configure(RagConfig::from_env())
    }

    /// The active configuration.
    pub fn config(&self) -> Arc<RagConfig> {
        Arc::clone(&self.core().config)
    }

    // ------------------------------------------------------------------
    // Ingestion
    // ------------------------------------------------------------------

    /// Ingest a file from disk. The document row is only written once
    /// parsing succeeds; the pipeline runs in the background.
    pub async fn add_document(&self, path: &Path) -> AddDocumentResult {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => return AddDocumentResult::failure("could not read source file", e),
        };
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        self.add_document_bytes(&bytes, &name, path.display().to_string())
            .await
    }

    /// Ingest an in-memory blob; `name` drives parser dispatch and
    /// `location` is recorded as the document origin.
    pub async fn add_document_bytes(
        &self,
        data: &[u8],
        name: &str,
        location: String,
    ) -> AddDocumentResult {
        let core = self.core();

        // Parse first: a failed parse writes no document row.
        let parsed = match core.parsers.parse_bytes(data, name).await {
            Ok(parsed) => parsed,
            Err(e) => return AddDocumentResult::failure("failed to parse source", e),
        };

        let title = parsed
            .title
            .clone()
            .unwrap_or_else(|| title_from_name(name));

        let mut document = Document::new(location, title.clone(), parsed.document_type);
        document.file_metadata = parsed.file_metadata.clone();
        document.file_blob = Some(data.to_vec());

        if let Err(e) = self.store.insert_document(&document).await {
            return AddDocumentResult::failure("failed to persist document", e);
        }

        let content_length = parsed.content.len();
        let embeddings_queued = !parsed.content.trim().is_empty();

        if let Err(e) = core.runner.enqueue(document.id).await {
            warn!(document_id = %document.id, error = %e, "pipeline enqueue failed");
        }

        AddDocumentResult {
            success: true,
            document_id: Some(document.id),
            title: Some(title),
            document_type: Some(parsed.document_type),
            content_length,
            embeddings_queued,
            message: "document queued for processing".to_string(),
            error: None,
        }
    }

    /// Ingest raw text directly. Metadata is generated synchronously;
    /// embeddings are queued.
    pub async fn add_text(&self, content: &str, title: &str) -> Result<Uuid> {
        if content.trim().is_empty() {
            return Err(Error::Parse(ParseError::EmptySource(
                "add_text requires non-empty content".to_string(),
            )));
        }

        let core = self.core();
        let document = Document::new(format!("text://{title}"), title, DocumentType::Text);
        self.store.insert_document(&document).await?;

        let text = ContentRecord::Text(TextContent {
            id: Uuid::new_v4(),
            document_id: document.id,
            content: content.to_string(),
            embedding_model: Some(core.gateway.embedding_model()),
            chunk_size: core.config.chunking.chunk_size,
            overlap: core.config.chunking.overlap,
            metadata: Metadata::new(),
            created_at: Utc::now(),
        });
        self.store.insert_content(&text).await?;
        self.store
            .set_status(document.id, DocumentStatus::Processing)
            .await?;

        // Metadata now, embeddings in the background.
        ragkit_jobs::stages::generate_metadata(core.runner.context(), document.id).await?;
        core.runner
            .enqueue_stage(document.id, JobStage::GenerateEmbeddings)
            .await?;

        Ok(document.id)
    }

    /// Ingest every file in a directory, producing a per-file result.
    /// Image files are skipped by default.
    pub async fn add_directory(&self, path: &Path, recursive: bool) -> Result<Vec<FileIngestResult>> {
        let mut results = Vec::new();
        let mut pending = vec![path.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(Error::Io)?;
            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let entry_path = entry.path();

                if entry_path.is_dir() {
                    if recursive {
                        pending.push(entry_path);
                    }
                    continue;
                }

                if is_image_file(&entry_path) {
                    continue;
                }

                let outcome = self.add_document(&entry_path).await;
                results.push(FileIngestResult {
                    path: entry_path,
                    success: outcome.success,
                    document_id: outcome.document_id,
                    error: outcome.error,
                });
            }
        }

        Ok(results)
    }

    /// Run the ingestion pipeline inline for a document. The queued jobs
    /// do this in the background; call it directly to wait for the
    /// `processed` transition.
    pub async fn process_document(&self, id: Uuid) -> Result<()> {
        self.core().runner.run_pipeline(id, None).await
    }

    // ------------------------------------------------------------------
    // Retrieval
    // ------------------------------------------------------------------

    /// Semantic search.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse> {
        let results = self.core().engine.search(query, options).await?;
        Ok(SearchResponse {
            query: query.to_string(),
            total_results: results.len(),
            results,
        })
    }

    /// Semantic search from a text query or a pre-computed vector.
    pub async fn search_similar_content(
        &self,
        input: QueryInput,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.core().engine.search_similar_content(input, options).await
    }

    /// Hybrid semantic + lexical search.
    pub async fn hybrid_search(
        &self,
        query: &str,
        query_vector: Option<Vec<f32>>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.core().engine.hybrid_search(query, query_vector, options).await
    }

    /// Semantic search restricted by facet filters on document metadata.
    pub async fn faceted_search(
        &self,
        query: &str,
        facets: &ragkit_core::FacetFilters,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        self.core().engine.faceted_search(query, facets, options).await
    }

    /// Retrieve context chunks for a query.
    pub async fn get_context(&self, query: &str, limit: usize) -> Result<ContextResult> {
        let options = SearchOptions {
            limit,
            ..SearchOptions::default()
        };
        let hits = self.core().engine.search(query, &options).await?;

        let context_chunks: Vec<ContextChunk> = hits
            .into_iter()
            .map(|hit| ContextChunk {
                content: hit.content,
                source: hit.document_location,
                similarity: hit.similarity,
                chunk_index: hit.chunk_index,
            })
            .collect();

        let combined_context = context_chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Ok(ContextResult {
            total_chunks: context_chunks.len(),
            context_chunks,
            combined_context,
        })
    }

    /// Render a prompt with retrieved context substituted into the
    /// template. Without any context the original prompt is returned
    /// verbatim.
    pub async fn enhance_prompt(&self, prompt: &str, context_limit: usize) -> Result<EnhancedPrompt> {
        let context = self.get_context(prompt, context_limit).await?;

        if context.total_chunks == 0 {
            return Ok(EnhancedPrompt {
                prompt: prompt.to_string(),
                context_count: 0,
            });
        }

        let rendered = PROMPT_TEMPLATE
            .replace("{{context}}", &context.combined_context)
            .replace("{{prompt}}", prompt);

        Ok(EnhancedPrompt {
            prompt: rendered,
            context_count: context.total_chunks,
        })
    }

    // ------------------------------------------------------------------
    // Document lifecycle
    // ------------------------------------------------------------------

    /// Current pipeline status of a document.
    pub async fn document_status(&self, id: Uuid) -> Result<Option<DocumentStatus>> {
        Ok(self
            .store
            .get_document(id)
            .await?
            .map(|document| document.status))
    }

    /// Fetch a document.
    pub async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        Ok(self.store.get_document(id).await?)
    }

    /// Apply caller updates to a document.
    pub async fn update_document(
        &self,
        id: Uuid,
        update: DocumentUpdate,
    ) -> Result<Option<Document>> {
        let Some(mut document) = self.store.get_document(id).await? else {
            return Ok(None);
        };

        if let Some(title) = update.title {
            document.title = title;
        }
        if let Some(metadata) = update.metadata {
            // AI and file metadata are disjoint; only the AI side changes.
            for (key, value) in metadata {
                document.metadata.insert(key, value);
            }
        }

        self.store.update_document(&document).await?;
        Ok(self.store.get_document(id).await?)
    }

    /// Delete a document; contents and embeddings cascade.
    pub async fn delete_document(&self, id: Uuid) -> Result<bool> {
        Ok(self.store.delete_document(id).await?)
    }

    /// List documents with optional filters.
    pub async fn list_documents(&self, options: &ListOptions) -> Result<Vec<Document>> {
        Ok(self.store.list_documents(options).await?)
    }

    /// Corpus statistics.
    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.stats().await?)
    }

    /// Whether the underlying store answers queries.
    pub async fn healthy(&self) -> bool {
        self.store.stats().await.is_ok()
    }
}

impl Drop for RagClient {
    fn drop(&mut self) {
        self.core().runner.shutdown();
    }
}

/// Build the configuration-derived component set.
fn build_core(config: RagConfig, store: &Arc<dyn DocumentStore>) -> Result<ClientCore> {
    let gateway = Arc::new(LlmGateway::new(config.llm.clone())?);
    let parsers = Arc::new(ParserRegistry::standard());
    let chunkers = Arc::new(ChunkerRegistry::standard());
    let generator = Arc::new(MetadataGenerator::new(Arc::clone(&gateway)));

    let ctx = JobContext {
        store: Arc::clone(store),
        parsers: Arc::clone(&parsers),
        chunkers,
        gateway: Arc::clone(&gateway),
        generator,
        chunk_params: config.chunking,
    };
    let runner = JobRunner::new(ctx, config.jobs.workers);

    let engine = SearchEngine::with_config(
        Arc::clone(store),
        Arc::clone(&gateway),
        config.search.clone(),
    );

    Ok(ClientCore {
        config: Arc::new(config),
        gateway,
        engine,
        runner,
        parsers,
    })
}

/// Derive a display title from a file name by dropping the extension.
fn title_from_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    if stem.is_empty() {
        name.to_string()
    } else {
        stem.to_string()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
