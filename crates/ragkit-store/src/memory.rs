//! In-memory document store.
//!
//! The reference [`DocumentStore`] implementation: brute-force cosine
//! nearest-neighbor, tokenized lexical search, cascade delete, and the
//! atomic batch usage update. Production deployments swap in a store
//! backed by a vector-capable database; this one backs tests, development,
//! and small corpora.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ragkit_core::{
    ContentRecord, Document, DocumentStatus, DocumentStore, Embedding, LexicalHit, ListOptions,
    Neighbor, SearchFilters, StorageError, StoreStats,
};
use ragkit_core::DocumentRef;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// In-memory store over `RwLock`-guarded maps.
pub struct MemoryStore {
    documents: Arc<RwLock<HashMap<Uuid, Document>>>,
    contents: Arc<RwLock<HashMap<Uuid, ContentRecord>>>,
    embeddings: Arc<RwLock<HashMap<Uuid, Embedding>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(HashMap::new())),
            contents: Arc::new(RwLock::new(HashMap::new())),
            embeddings: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Compute cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_document(&self, document: &Document) -> Result<(), StorageError> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&document.id) {
            return Err(StorageError::Constraint(format!(
                "document {} already exists",
                document.id
            )));
        }
        documents.insert(document.id, document.clone());
        debug!(document_id = %document.id, "inserted document");
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, StorageError> {
        Ok(self.documents.read().await.get(&id).cloned())
    }

    async fn update_document(&self, document: &Document) -> Result<(), StorageError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&document.id) {
            Some(existing) => {
                *existing = Document {
                    updated_at: Utc::now(),
                    ..document.clone()
                };
                Ok(())
            }
            None => Err(StorageError::NotFound(document.id.to_string())),
        }
    }

    async fn set_status(&self, id: Uuid, status: DocumentStatus) -> Result<(), StorageError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(&id) {
            Some(document) => {
                if document.status != status && !document.status.can_transition_to(status) {
                    return Err(StorageError::Constraint(format!(
                        "illegal status transition: {} -> {}",
                        document.status, status
                    )));
                }
                document.status = status;
                document.updated_at = Utc::now();
                Ok(())
            }
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, StorageError> {
        let mut documents = self.documents.write().await;
        let mut contents = self.contents.write().await;
        let mut embeddings = self.embeddings.write().await;

        if documents.remove(&id).is_none() {
            return Ok(false);
        }

        let content_ids: Vec<Uuid> = contents
            .values()
            .filter(|c| c.document_id() == id)
            .map(|c| c.id())
            .collect();
        contents.retain(|_, c| c.document_id() != id);
        embeddings.retain(|_, e| !content_ids.contains(&e.content_id));

        debug!(document_id = %id, cascade_contents = content_ids.len(), "deleted document");
        Ok(true)
    }

    async fn list_documents(&self, options: &ListOptions) -> Result<Vec<Document>, StorageError> {
        let documents = self.documents.read().await;
        let mut matching: Vec<Document> = documents
            .values()
            .filter(|d| options.status.map_or(true, |s| d.status == s))
            .filter(|d| options.document_type.map_or(true, |t| d.document_type == t))
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let limited: Vec<Document> = matching
            .into_iter()
            .skip(options.offset)
            .take(options.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(limited)
    }

    async fn insert_content(&self, content: &ContentRecord) -> Result<(), StorageError> {
        let documents = self.documents.read().await;
        if !documents.contains_key(&content.document_id()) {
            return Err(StorageError::Constraint(format!(
                "content references missing document {}",
                content.document_id()
            )));
        }
        drop(documents);

        let mut contents = self.contents.write().await;
        contents.insert(content.id(), content.clone());
        Ok(())
    }

    async fn contents_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<ContentRecord>, StorageError> {
        let contents = self.contents.read().await;
        let mut matching: Vec<ContentRecord> = contents
            .values()
            .filter(|c| c.document_id() == document_id)
            .cloned()
            .collect();
        matching.sort_by_key(|c| c.id());
        Ok(matching)
    }

    async fn insert_embedding(&self, embedding: &Embedding) -> Result<(), StorageError> {
        if embedding.vector.is_empty() {
            return Err(StorageError::Constraint(
                "embedding requires a non-empty vector".to_string(),
            ));
        }

        let contents = self.contents.read().await;
        match contents.get(&embedding.content_id) {
            Some(content) if content.kind() == embedding.content_kind => {}
            Some(_) => {
                return Err(StorageError::Constraint(format!(
                    "embedding kind mismatch for content {}",
                    embedding.content_id
                )))
            }
            None => {
                return Err(StorageError::Constraint(format!(
                    "embedding references missing content {}",
                    embedding.content_id
                )))
            }
        }
        drop(contents);

        let mut embeddings = self.embeddings.write().await;
        let duplicate = embeddings.values().any(|e| {
            e.content_kind == embedding.content_kind
                && e.content_id == embedding.content_id
                && e.chunk_index == embedding.chunk_index
        });
        if duplicate {
            return Err(StorageError::Constraint(format!(
                "chunk_index {} already exists for {} {}",
                embedding.chunk_index, embedding.content_kind, embedding.content_id
            )));
        }

        embeddings.insert(embedding.id, embedding.clone());
        Ok(())
    }

    async fn embeddings_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<Embedding>, StorageError> {
        let contents = self.contents.read().await;
        let content_ids: Vec<Uuid> = contents
            .values()
            .filter(|c| c.document_id() == document_id)
            .map(|c| c.id())
            .collect();
        drop(contents);

        let embeddings = self.embeddings.read().await;
        let mut matching: Vec<Embedding> = embeddings
            .values()
            .filter(|e| content_ids.contains(&e.content_id))
            .cloned()
            .collect();
        matching.sort_by_key(|e| (e.content_id, e.chunk_index));
        Ok(matching)
    }

    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: usize,
        filters: &SearchFilters,
    ) -> Result<Vec<Neighbor>, StorageError> {
        let documents = self.documents.read().await;
        let contents = self.contents.read().await;
        let embeddings = self.embeddings.read().await;

        let mut candidates: Vec<Neighbor> = Vec::new();

        for embedding in embeddings.values() {
            if let Some(model) = &filters.embedding_model {
                if &embedding.embedding_model != model {
                    continue;
                }
            }

            let Some(content) = contents.get(&embedding.content_id) else {
                continue;
            };
            let Some(document) = documents.get(&content.document_id()) else {
                continue;
            };

            if !document_matches(document, filters) {
                continue;
            }

            let similarity = Self::cosine_similarity(vector, &embedding.vector);
            candidates.push(Neighbor {
                embedding: embedding.clone(),
                distance: 1.0 - similarity,
                document: DocumentRef {
                    id: document.id,
                    title: document.title.clone(),
                    location: document.location.clone(),
                },
            });
        }

        candidates.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(k);
        Ok(candidates)
    }

    async fn lexical_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<LexicalHit>, StorageError> {
        let tokens: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            return Ok(vec![]);
        }

        let documents = self.documents.read().await;
        let mut hits: Vec<LexicalHit> = Vec::new();

        for document in documents.values() {
            let haystack = searchable_text(document);
            let matched = tokens.iter().filter(|t| haystack.contains(*t)).count();
            if matched == 0 {
                continue;
            }

            let snippet = document
                .metadata
                .get("summary")
                .and_then(Value::as_str)
                .unwrap_or(&document.title)
                .to_string();

            hits.push(LexicalHit {
                document: DocumentRef {
                    id: document.id,
                    title: document.title.clone(),
                    location: document.location.clone(),
                },
                relevance: matched as f32 / tokens.len() as f32,
                snippet,
            });
        }

        hits.sort_by(|a, b| {
            b.relevance
                .partial_cmp(&a.relevance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.document.id.cmp(&b.document.id))
        });
        hits.truncate(limit);
        Ok(hits)
    }

    async fn record_usage(
        &self,
        embedding_ids: &[Uuid],
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        // One write lock for the whole batch keeps the update atomic.
        let mut embeddings = self.embeddings.write().await;
        let mut updated = 0u64;
        for id in embedding_ids {
            if let Some(embedding) = embeddings.get_mut(id) {
                embedding.usage_count += 1;
                embedding.returned_at = Some(at);
                updated += 1;
            }
        }
        debug!(updated, "recorded usage batch");
        Ok(updated)
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let documents = self.documents.read().await;
        let contents = self.contents.read().await;
        let embeddings = self.embeddings.read().await;

        let count_status = |status: DocumentStatus| {
            documents.values().filter(|d| d.status == status).count() as u64
        };

        Ok(StoreStats {
            total_documents: documents.len() as u64,
            pending_documents: count_status(DocumentStatus::Pending),
            processing_documents: count_status(DocumentStatus::Processing),
            processed_documents: count_status(DocumentStatus::Processed),
            error_documents: count_status(DocumentStatus::Error),
            total_contents: contents.len() as u64,
            total_embeddings: embeddings.len() as u64,
        })
    }
}

/// Apply document-level candidate filters.
fn document_matches(document: &Document, filters: &SearchFilters) -> bool {
    if let Some(id) = filters.document_id {
        if document.id != id {
            return false;
        }
    }

    if let Some(document_type) = filters.document_type {
        if document.document_type != document_type {
            return false;
        }
    }

    if let Some(classification) = &filters.classification {
        let matches = document
            .metadata
            .get("classification")
            .and_then(Value::as_str)
            .is_some_and(|c| c == classification);
        if !matches {
            return false;
        }
    }

    if !filters.tags.is_empty() {
        let Some(tags) = document.metadata.get("tags").and_then(Value::as_array) else {
            return false;
        };
        let has_all = filters.tags.iter().all(|wanted| {
            tags.iter()
                .filter_map(Value::as_str)
                .any(|tag| tag == wanted)
        });
        if !has_all {
            return false;
        }
    }

    true
}

/// Lowercased text the lexical index covers: title plus the AI-metadata
/// summary, keywords, and description fields.
fn searchable_text(document: &Document) -> String {
    let mut parts = vec![document.title.to_lowercase()];

    for field in ["summary", "description"] {
        if let Some(text) = document.metadata.get(field).and_then(Value::as_str) {
            parts.push(text.to_lowercase());
        }
    }

    if let Some(keywords) = document.metadata.get("keywords").and_then(Value::as_array) {
        for keyword in keywords.iter().filter_map(Value::as_str) {
            parts.push(keyword.to_lowercase());
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragkit_core::{ContentKind, DocumentType, Metadata, TextContent};
    use serde_json::json;

    fn make_document(title: &str) -> Document {
        Document::new(format!("/docs/{title}"), title, DocumentType::Text)
    }

    fn make_text_content(document_id: Uuid, body: &str) -> ContentRecord {
        ContentRecord::Text(TextContent {
            id: Uuid::new_v4(),
            document_id,
            content: body.to_string(),
            embedding_model: None,
            chunk_size: 1000,
            overlap: 200,
            metadata: Metadata::new(),
            created_at: Utc::now(),
        })
    }

    fn make_embedding(content_id: Uuid, chunk_index: u32, vector: Vec<f32>) -> Embedding {
        Embedding {
            id: Uuid::new_v4(),
            content_kind: ContentKind::Text,
            content_id,
            chunk_index,
            content: format!("chunk {chunk_index}"),
            vector,
            embedding_model: "test-model".to_string(),
            usage_count: 0,
            returned_at: None,
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    /// Store seeded with one document, one text content, and n embeddings.
    async fn seeded(n: u32) -> (MemoryStore, Document, Uuid) {
        let store = MemoryStore::new();
        let document = make_document("seed");
        store.insert_document(&document).await.unwrap();

        let content = make_text_content(document.id, "body");
        let content_id = content.id();
        store.insert_content(&content).await.unwrap();

        for i in 0..n {
            let v = vec![1.0, i as f32, 0.0];
            store
                .insert_embedding(&make_embedding(content_id, i, v))
                .await
                .unwrap();
        }
        (store, document, content_id)
    }

    #[tokio::test]
    async fn test_insert_and_get_document() {
        let store = MemoryStore::new();
        let document = make_document("a");
        store.insert_document(&document).await.unwrap();

        let loaded = store.get_document(document.id).await.unwrap().unwrap();
        assert_eq!(loaded.title, "a");
    }

    #[tokio::test]
    async fn test_duplicate_document_id_rejected() {
        let store = MemoryStore::new();
        let document = make_document("a");
        store.insert_document(&document).await.unwrap();

        let err = store.insert_document(&document).await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let store = MemoryStore::new();
        let err = store.update_document(&make_document("x")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_set_status() {
        let (store, document, _) = seeded(0).await;
        store
            .set_status(document.id, DocumentStatus::Processing)
            .await
            .unwrap();
        let loaded = store.get_document(document.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processing);
        assert!(loaded.updated_at >= document.updated_at);
    }

    #[tokio::test]
    async fn test_content_requires_document() {
        let store = MemoryStore::new();
        let orphan = make_text_content(Uuid::new_v4(), "x");
        let err = store.insert_content(&orphan).await.unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_embedding_requires_content() {
        let store = MemoryStore::new();
        let err = store
            .insert_embedding(&make_embedding(Uuid::new_v4(), 0, vec![1.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_embedding_empty_vector_rejected() {
        let (store, _, content_id) = seeded(0).await;
        let err = store
            .insert_embedding(&make_embedding(content_id, 0, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_chunk_index_unique_per_content() {
        let (store, _, content_id) = seeded(1).await;
        let err = store
            .insert_embedding(&make_embedding(content_id, 0, vec![0.5, 0.5, 0.5]))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (store, document, _) = seeded(5).await;

        // A second document must be untouched by the cascade.
        let other = make_document("other");
        store.insert_document(&other).await.unwrap();
        let other_content = make_text_content(other.id, "x");
        store.insert_content(&other_content).await.unwrap();
        store
            .insert_embedding(&make_embedding(other_content.id(), 0, vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();

        let deleted = store.delete_document(document.id).await.unwrap();
        assert!(deleted);

        assert!(store.get_document(document.id).await.unwrap().is_none());
        assert!(store
            .contents_for_document(document.id)
            .await
            .unwrap()
            .is_empty());
        assert!(store
            .embeddings_for_document(document.id)
            .await
            .unwrap()
            .is_empty());

        // Other document intact.
        assert_eq!(store.embeddings_for_document(other.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_returns_false() {
        let store = MemoryStore::new();
        assert!(!store.delete_document(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_documents_filters() {
        let store = MemoryStore::new();
        let mut a = make_document("a");
        a.status = DocumentStatus::Processed;
        let b = make_document("b");
        store.insert_document(&a).await.unwrap();
        store.insert_document(&b).await.unwrap();

        let processed = store
            .list_documents(&ListOptions {
                status: Some(DocumentStatus::Processed),
                ..ListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].title, "a");

        let limited = store
            .list_documents(&ListOptions {
                limit: Some(1),
                ..ListOptions::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_nearest_neighbors_orders_by_distance() {
        let (store, _, content_id) = seeded(0).await;
        store
            .insert_embedding(&make_embedding(content_id, 0, vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        store
            .insert_embedding(&make_embedding(content_id, 1, vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();
        store
            .insert_embedding(&make_embedding(content_id, 2, vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();

        let neighbors = store
            .nearest_neighbors(&[1.0, 0.0, 0.0], 2, &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].embedding.chunk_index, 0);
        assert!(neighbors[0].distance < 0.001);
        assert_eq!(neighbors[1].embedding.chunk_index, 2);
    }

    #[tokio::test]
    async fn test_nearest_neighbors_model_filter() {
        let (store, _, content_id) = seeded(1).await;
        let filters = SearchFilters {
            embedding_model: Some("another-model".to_string()),
            ..SearchFilters::default()
        };
        let neighbors = store
            .nearest_neighbors(&[1.0, 0.0, 0.0], 10, &filters)
            .await
            .unwrap();
        assert!(neighbors.is_empty());
    }

    #[tokio::test]
    async fn test_nearest_neighbors_classification_filter() {
        let (store, mut document, _) = seeded(1).await;
        document
            .metadata
            .insert("classification".to_string(), "article".into());
        store.update_document(&document).await.unwrap();

        let filters = SearchFilters {
            classification: Some("article".to_string()),
            ..SearchFilters::default()
        };
        assert_eq!(
            store
                .nearest_neighbors(&[1.0, 0.0, 0.0], 10, &filters)
                .await
                .unwrap()
                .len(),
            1
        );

        let filters = SearchFilters {
            classification: Some("report".to_string()),
            ..SearchFilters::default()
        };
        assert!(store
            .nearest_neighbors(&[1.0, 0.0, 0.0], 10, &filters)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_lexical_search_matches_title_and_metadata() {
        let store = MemoryStore::new();
        let mut a = make_document("neural networks primer");
        a.metadata
            .insert("keywords".to_string(), json!(["deep-learning"]));
        let b = make_document("cooking with cast iron");
        store.insert_document(&a).await.unwrap();
        store.insert_document(&b).await.unwrap();

        let hits = store.lexical_search("neural networks", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].document.id, a.id);
        assert!((hits[0].relevance - 1.0).abs() < f32::EPSILON);

        let hits = store.lexical_search("deep-learning", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_lexical_search_case_insensitive() {
        let store = MemoryStore::new();
        let document = make_document("Rust Handbook");
        store.insert_document(&document).await.unwrap();

        let hits = store.lexical_search("RUST", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_lexical_search_empty_query() {
        let (store, _, _) = seeded(1).await;
        assert!(store.lexical_search("  ", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_record_usage_batch() {
        let (store, document, _) = seeded(3).await;
        let embeddings = store.embeddings_for_document(document.id).await.unwrap();
        let ids: Vec<Uuid> = embeddings.iter().take(2).map(|e| e.id).collect();

        let at = Utc::now();
        let updated = store.record_usage(&ids, at).await.unwrap();
        assert_eq!(updated, 2);

        let embeddings = store.embeddings_for_document(document.id).await.unwrap();
        let touched: Vec<&Embedding> = embeddings
            .iter()
            .filter(|e| ids.contains(&e.id))
            .collect();
        for e in touched {
            assert_eq!(e.usage_count, 1);
            assert_eq!(e.returned_at, Some(at));
        }
        let untouched = embeddings.iter().find(|e| !ids.contains(&e.id)).unwrap();
        assert_eq!(untouched.usage_count, 0);
        assert!(untouched.returned_at.is_none());
    }

    #[tokio::test]
    async fn test_record_usage_unknown_ids_skipped() {
        let (store, _, _) = seeded(1).await;
        let updated = store
            .record_usage(&[Uuid::new_v4()], Utc::now())
            .await
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let (store, _, _) = seeded(4).await;
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.pending_documents, 1);
        assert_eq!(stats.total_contents, 1);
        assert_eq!(stats.total_embeddings, 4);
    }

    #[test]
    fn test_cosine_similarity_reference() {
        let sim = MemoryStore::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((sim - 1.0).abs() < 0.001);

        let sim = MemoryStore::cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]);
        assert!((sim + 1.0).abs() < 0.001);

        let sim = MemoryStore::cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]);
        assert_eq!(sim, 0.0);

        let sim = MemoryStore::cosine_similarity(&[1.0], &[1.0, 0.0]);
        assert_eq!(sim, 0.0);
    }
}
