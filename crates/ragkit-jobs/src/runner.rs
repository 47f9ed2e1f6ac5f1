//! Job runner: a worker pool with per-document serialization.
//!
//! Jobs arrive as `{document_id, stage}` messages on an mpsc queue. Each
//! worker takes a message, serializes on a per-document keyed mutex, runs
//! the stage, and enqueues the next stage on success. A failure moves the
//! document to `error` and schedules nothing further for it. Workers
//! check a shutdown watch channel between stages; a running stage is
//! never interrupted mid-call.

use ragkit_chunker::ChunkerRegistry;
use ragkit_core::{ChunkParams, DocumentStatus, DocumentStore, Result};
use ragkit_extract::ParserRegistry;
use ragkit_llm::LlmGateway;
use ragkit_meta::MetadataGenerator;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::stages;

/// Shared components every stage needs.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn DocumentStore>,
    pub parsers: Arc<ParserRegistry>,
    pub chunkers: Arc<ChunkerRegistry>,
    pub gateway: Arc<LlmGateway>,
    pub generator: Arc<MetadataGenerator>,
    /// Chunk parameters for contents that do not carry their own
    pub chunk_params: ChunkParams,
}

/// One pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    ExtractText,
    GenerateMetadata,
    GenerateEmbeddings,
}

impl JobStage {
    fn next(self) -> Option<Self> {
        match self {
            Self::ExtractText => Some(Self::GenerateMetadata),
            Self::GenerateMetadata => Some(Self::GenerateEmbeddings),
            Self::GenerateEmbeddings => None,
        }
    }
}

/// A queued job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub document_id: Uuid,
    pub stage: JobStage,
}

/// Background job runner.
pub struct JobRunner {
    ctx: JobContext,
    queue_tx: mpsc::Sender<JobRequest>,
    shutdown_tx: watch::Sender<bool>,
    locks: DocumentLocks,
}

type DocumentLocks = Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>;

impl JobRunner {
    /// Create a runner and spawn `workers` consumer tasks.
    pub fn new(ctx: JobContext, workers: usize) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::channel::<JobRequest>(1024);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let locks: DocumentLocks = Arc::new(Mutex::new(HashMap::new()));

        let runner = Arc::new(Self {
            ctx,
            queue_tx: queue_tx.clone(),
            shutdown_tx,
            locks,
        });

        let queue_rx = Arc::new(Mutex::new(queue_rx));
        for worker_id in 0..workers.max(1) {
            let ctx = runner.ctx.clone();
            let queue_rx = Arc::clone(&queue_rx);
            let queue_tx = queue_tx.clone();
            let shutdown_rx = shutdown_rx.clone();
            let locks = Arc::clone(&runner.locks);

            tokio::spawn(async move {
                worker_loop(worker_id, ctx, queue_rx, queue_tx, shutdown_rx, locks).await;
            });
        }

        runner
    }

    /// Queue the full pipeline for a document.
    pub async fn enqueue(&self, document_id: Uuid) -> Result<()> {
        self.enqueue_stage(document_id, JobStage::ExtractText).await
    }

    /// Queue a single stage.
    pub async fn enqueue_stage(&self, document_id: Uuid, stage: JobStage) -> Result<()> {
        self.queue_tx
            .send(JobRequest { document_id, stage })
            .await
            .map_err(|e| {
                ragkit_core::Error::Storage(ragkit_core::StorageError::Unavailable(format!(
                    "job queue closed: {e}"
                )))
            })?;
        debug!(%document_id, ?stage, "job queued");
        Ok(())
    }

    /// Run the full pipeline inline, serialized with queued jobs for the
    /// same document. Errors surface to the caller; the document is left
    /// in `error`.
    pub async fn run_pipeline(
        &self,
        document_id: Uuid,
        params: Option<ChunkParams>,
    ) -> Result<()> {
        let lock = document_lock(&self.locks, document_id).await;
        let _guard = lock.lock().await;

        let result = async {
            stages::extract_text(&self.ctx, document_id).await?;
            stages::generate_metadata(&self.ctx, document_id).await?;
            stages::generate_embeddings(&self.ctx, document_id, params).await?;
            stages::finalize(&self.ctx, document_id).await
        }
        .await;

        if let Err(e) = &result {
            let _ = self
                .ctx
                .store
                .set_status(document_id, DocumentStatus::Error)
                .await;
            error!(%document_id, error = %e, "pipeline failed");
        }
        result
    }

    /// Signal workers to stop after their current stage.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        info!("job runner shutting down");
    }

    /// The shared job context.
    pub fn context(&self) -> &JobContext {
        &self.ctx
    }
}

/// Get (or create) the keyed mutex serializing one document's jobs.
async fn document_lock(locks: &DocumentLocks, document_id: Uuid) -> Arc<Mutex<()>> {
    let mut map = locks.lock().await;
    Arc::clone(map.entry(document_id).or_default())
}

async fn worker_loop(
    worker_id: usize,
    ctx: JobContext,
    queue_rx: Arc<Mutex<mpsc::Receiver<JobRequest>>>,
    queue_tx: mpsc::Sender<JobRequest>,
    shutdown_rx: watch::Receiver<bool>,
    locks: DocumentLocks,
) {
    debug!(worker_id, "job worker started");
    loop {
        // Cancellation is honored between stages, never mid-stage.
        if *shutdown_rx.borrow() {
            break;
        }

        let request = {
            let mut rx = queue_rx.lock().await;
            rx.recv().await
        };
        let Some(request) = request else {
            break;
        };

        let lock = document_lock(&locks, request.document_id).await;
        let _guard = lock.lock().await;

        let outcome = match request.stage {
            JobStage::ExtractText => stages::extract_text(&ctx, request.document_id).await,
            JobStage::GenerateMetadata => {
                stages::generate_metadata(&ctx, request.document_id).await
            }
            JobStage::GenerateEmbeddings => {
                match stages::generate_embeddings(&ctx, request.document_id, None).await {
                    Ok(()) => stages::finalize(&ctx, request.document_id).await,
                    Err(e) => Err(e),
                }
            }
        };

        match outcome {
            Ok(()) => {
                info!(worker_id, document_id = %request.document_id, stage = ?request.stage, "job complete");
                if let Some(next) = request.stage.next() {
                    if queue_tx
                        .send(JobRequest {
                            document_id: request.document_id,
                            stage: next,
                        })
                        .await
                        .is_err()
                    {
                        warn!(worker_id, "queue closed, dropping follow-up stage");
                    }
                }
            }
            Err(e) => {
                // Failures stop the pipeline for this document.
                error!(worker_id, document_id = %request.document_id, stage = ?request.stage, error = %e, "job failed");
                let _ = ctx
                    .store
                    .set_status(request.document_id, DocumentStatus::Error)
                    .await;
            }
        }
    }
    debug!(worker_id, "job worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_core::{Document, DocumentType, Metadata};
    use ragkit_llm::LlmConfig;
    use ragkit_store::MemoryStore;

    fn test_context(store: Arc<MemoryStore>) -> JobContext {
        let gateway = Arc::new(
            LlmGateway::new(LlmConfig {
                embedding_dimension: 8,
                summary_min_content_length: 10,
                ..LlmConfig::default()
            })
            .unwrap(),
        );
        JobContext {
            store,
            parsers: Arc::new(ParserRegistry::standard()),
            chunkers: Arc::new(ChunkerRegistry::standard()),
            gateway: Arc::clone(&gateway),
            generator: Arc::new(MetadataGenerator::new(gateway)),
            chunk_params: ChunkParams::default(),
        }
    }

    fn text_document(body: &str) -> Document {
        let mut document = Document::new("/docs/sample.txt", "sample", DocumentType::Text);
        document.file_blob = Some(body.as_bytes().to_vec());
        document
    }

    #[tokio::test]
    async fn test_pipeline_processes_document() {
        let store = Arc::new(MemoryStore::new());
        let ctx = test_context(Arc::clone(&store));
        let runner = JobRunner::new(ctx, 1);

        let document = text_document(
            "Rust is a systems programming language. It is fast and memory safe. \
             The borrow checker enforces ownership rules at compile time.",
        );
        store.insert_document(&document).await.unwrap();

        runner.run_pipeline(document.id, None).await.unwrap();

        let processed = store.get_document(document.id).await.unwrap().unwrap();
        assert_eq!(processed.status, DocumentStatus::Processed);

        // TextContent written, metadata generated, embeddings persisted.
        let contents = store.contents_for_document(document.id).await.unwrap();
        assert_eq!(contents.len(), 1);
        assert!(processed.metadata.contains_key("summary"));

        let embeddings = store.embeddings_for_document(document.id).await.unwrap();
        assert!(!embeddings.is_empty());

        // chunk_index values form a contiguous prefix.
        let mut indexes: Vec<u32> = embeddings.iter().map(|e| e.chunk_index).collect();
        indexes.sort_unstable();
        let expected: Vec<u32> = (0..indexes.len() as u32).collect();
        assert_eq!(indexes, expected);
    }

    #[tokio::test]
    async fn test_pipeline_missing_document_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(test_context(Arc::clone(&store)), 1);

        // A deleted document is not an error.
        runner.run_pipeline(Uuid::new_v4(), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_pipeline_empty_extraction_sets_error() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(test_context(Arc::clone(&store)), 1);

        let document = text_document("   \n  ");
        store.insert_document(&document).await.unwrap();

        let result = runner.run_pipeline(document.id, None).await;
        assert!(result.is_err());

        let failed = store.get_document(document.id).await.unwrap().unwrap();
        assert_eq!(failed.status, DocumentStatus::Error);
    }

    #[tokio::test]
    async fn test_embeddings_stage_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let ctx = test_context(Arc::clone(&store));
        let runner = JobRunner::new(ctx, 1);

        let document = text_document("Some reasonably long content for embedding generation.");
        store.insert_document(&document).await.unwrap();
        runner.run_pipeline(document.id, None).await.unwrap();

        let first = store.embeddings_for_document(document.id).await.unwrap();
        assert!(!first.is_empty());

        // Re-running the embeddings stage must not duplicate anything.
        stages::generate_embeddings(runner.context(), document.id, None)
            .await
            .unwrap();
        let second = store.embeddings_for_document(document.id).await.unwrap();
        assert_eq!(first.len(), second.len());
    }

    #[tokio::test]
    async fn test_metadata_stage_skips_when_required_present() {
        let store = Arc::new(MemoryStore::new());
        let ctx = test_context(Arc::clone(&store));

        let mut document = text_document("content");
        document.metadata = serde_json::json!({
            "summary": "caller summary",
            "keywords": ["set"],
            "classification": "reference"
        })
        .as_object()
        .unwrap()
        .clone();
        store.insert_document(&document).await.unwrap();

        stages::generate_metadata(&ctx, document.id).await.unwrap();

        let unchanged = store.get_document(document.id).await.unwrap().unwrap();
        assert_eq!(unchanged.metadata["summary"], "caller summary");
    }

    #[tokio::test]
    async fn test_queued_pipeline_runs_to_processed() {
        let store = Arc::new(MemoryStore::new());
        let runner = JobRunner::new(test_context(Arc::clone(&store)), 2);

        let document = text_document(
            "Queued processing should reach the processed state eventually. \
             This body has enough text to produce at least one chunk.",
        );
        store.insert_document(&document).await.unwrap();
        runner.enqueue(document.id).await.unwrap();

        // Poll until the workers finish the three stages.
        let mut status = DocumentStatus::Pending;
        for _ in 0..100 {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            status = store
                .get_document(document.id)
                .await
                .unwrap()
                .unwrap()
                .status;
            if status == DocumentStatus::Processed {
                break;
            }
        }
        assert_eq!(status, DocumentStatus::Processed);

        runner.shutdown();
    }

    #[tokio::test]
    async fn test_media_document_gets_media_content() {
        let store = Arc::new(MemoryStore::new());
        let ctx = test_context(Arc::clone(&store));

        let mut document = Document::new("/pics/dot.png", "dot", DocumentType::Image);
        document.file_blob = Some(vec![1, 2, 3]);
        document.metadata = Metadata::new();
        store.insert_document(&document).await.unwrap();

        stages::extract_text(&ctx, document.id).await.unwrap();

        let contents = store.contents_for_document(document.id).await.unwrap();
        assert_eq!(contents.len(), 1);
        assert!(matches!(contents[0], ragkit_core::ContentRecord::Image(_)));
    }

    #[test]
    fn test_stage_ordering() {
        assert_eq!(JobStage::ExtractText.next(), Some(JobStage::GenerateMetadata));
        assert_eq!(
            JobStage::GenerateMetadata.next(),
            Some(JobStage::GenerateEmbeddings)
        );
        assert_eq!(JobStage::GenerateEmbeddings.next(), None);
    }
}
