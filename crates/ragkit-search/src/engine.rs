//! The search engine: semantic retrieval with usage-aware re-ranking,
//! hybrid fusion with lexical search, and facet filtering.

use chrono::Utc;
use ragkit_core::{
    Document, DocumentStore, Error, FacetFilters, LexicalHit, Metadata, Neighbor, Result,
    SearchError, SearchHit, SearchOptions, SearchType,
};
use ragkit_llm::LlmGateway;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::scoring::usage_score;

/// Ranking and fusion parameters.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Candidates below this similarity are dropped
    pub similarity_threshold: f32,
    /// Weight of the semantic side in hybrid fusion
    pub semantic_weight: f32,
    /// Weight of the lexical side in hybrid fusion
    pub text_weight: f32,
    /// Weight of frequency within the usage score
    pub frequency_weight: f32,
    /// Weight of recency within the usage score
    pub recency_weight: f32,
    /// Result limit when the caller passes zero
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.7,
            semantic_weight: 0.7,
            text_weight: 0.3,
            frequency_weight: 0.7,
            recency_weight: 0.3,
            default_limit: 10,
        }
    }
}

/// Either a text query (embedded first) or a pre-computed vector.
#[derive(Debug, Clone)]
pub enum QueryInput {
    Text(String),
    Vector(Vec<f32>),
}

/// Search engine over a document store and the LLM gateway.
pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
    gateway: Arc<LlmGateway>,
    config: SearchConfig,
}

impl SearchEngine {
    /// Create an engine with default ranking parameters.
    pub fn new(store: Arc<dyn DocumentStore>, gateway: Arc<LlmGateway>) -> Self {
        Self::with_config(store, gateway, SearchConfig::default())
    }

    /// Create an engine with explicit ranking parameters.
    pub fn with_config(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<LlmGateway>,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
        }
    }

    /// Semantic search over the corpus.
    ///
    /// A query that cannot be embedded is logged and yields an empty result
    /// set, never an error.
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchHit>> {
        match self.gateway.embed(query).await {
            Some(vector) => self.semantic_search(vector, options, true).await,
            None => {
                warn!(query, error = %SearchError::QueryNotEmbeddable, "returning empty result set");
                Ok(vec![])
            }
        }
    }

    /// Semantic search from either a text query or a pre-computed vector.
    pub async fn search_similar_content(
        &self,
        input: QueryInput,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let vector = match input {
            QueryInput::Text(query) => match self.gateway.embed(&query).await {
                Some(v) => v,
                None => {
                    warn!(query, error = %SearchError::QueryNotEmbeddable, "returning empty result set");
                    return Ok(vec![]);
                }
            },
            QueryInput::Vector(v) => v,
        };
        self.semantic_search(vector, options, true).await
    }

    /// Hybrid search: semantic and lexical hits fused under the configured
    /// weights, de-duplicated by document.
    pub async fn hybrid_search(
        &self,
        query: &str,
        query_vector: Option<Vec<f32>>,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let limit = self.effective_limit(options);

        let vector = match query_vector {
            Some(v) => Some(v),
            None => self.gateway.embed(query).await,
        };

        let semantic_hits = match vector {
            Some(v) => self.semantic_search(v, options, false).await?,
            None => {
                warn!(query, "hybrid search has no query vector, lexical side only");
                vec![]
            }
        };

        let lexical_hits = self
            .store
            .lexical_search(query, limit)
            .await
            .map_err(Error::Storage)?;

        let mut fused = self.fuse(semantic_hits, lexical_hits);
        fused.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.document_id.cmp(&b.document_id))
        });
        fused.truncate(limit);

        self.record_returned(&fused).await?;
        debug!(results = fused.len(), "hybrid search complete");
        Ok(fused)
    }

    /// Semantic search restricted by facet filters on document metadata.
    pub async fn faceted_search(
        &self,
        query: &str,
        facets: &FacetFilters,
        options: &SearchOptions,
    ) -> Result<Vec<SearchHit>> {
        let Some(vector) = self.gateway.embed(query).await else {
            warn!(query, error = %SearchError::QueryNotEmbeddable, "returning empty result set");
            return Ok(vec![]);
        };

        let limit = self.effective_limit(options);
        let neighbors = self
            .store
            .nearest_neighbors(&vector, limit * 2, &options.filters)
            .await
            .map_err(Error::Storage)?;

        // Facet checks need the owning documents; fetch each once.
        let mut allowed: HashMap<Uuid, bool> = HashMap::new();
        let mut filtered = Vec::new();
        for neighbor in neighbors {
            let document_id = neighbor.document.id;
            let matches = match allowed.get(&document_id) {
                Some(cached) => *cached,
                None => {
                    let matches = match self
                        .store
                        .get_document(document_id)
                        .await
                        .map_err(Error::Storage)?
                    {
                        Some(document) => facet_matches(&document, facets),
                        None => false,
                    };
                    allowed.insert(document_id, matches);
                    matches
                }
            };
            if matches {
                filtered.push(neighbor);
            }
        }

        let hits = self.rank(filtered, options, limit);
        self.record_returned(&hits).await?;
        Ok(hits)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn semantic_search(
        &self,
        vector: Vec<f32>,
        options: &SearchOptions,
        record: bool,
    ) -> Result<Vec<SearchHit>> {
        let limit = self.effective_limit(options);

        // Over-fetch so threshold filtering still fills the page.
        let neighbors = self
            .store
            .nearest_neighbors(&vector, limit * 2, &options.filters)
            .await
            .map_err(Error::Storage)?;

        let hits = self.rank(neighbors, options, limit);
        if record {
            self.record_returned(&hits).await?;
        }
        debug!(results = hits.len(), "semantic search complete");
        Ok(hits)
    }

    /// Threshold, score, sort, truncate.
    fn rank(
        &self,
        neighbors: Vec<Neighbor>,
        options: &SearchOptions,
        limit: usize,
    ) -> Vec<SearchHit> {
        let threshold = options
            .similarity_threshold
            .unwrap_or(self.config.similarity_threshold);
        let now = Utc::now();

        let mut hits: Vec<SearchHit> = neighbors
            .into_iter()
            .filter_map(|neighbor| {
                let similarity = 1.0 - neighbor.distance;
                if similarity < threshold {
                    return None;
                }

                let usage = usage_score(
                    neighbor.embedding.usage_count,
                    neighbor.embedding.returned_at,
                    now,
                    self.config.frequency_weight,
                    self.config.recency_weight,
                );

                Some(SearchHit {
                    embedding_id: Some(neighbor.embedding.id),
                    content: neighbor.embedding.content.clone(),
                    document_id: neighbor.document.id,
                    document_title: neighbor.document.title.clone(),
                    document_location: neighbor.document.location.clone(),
                    chunk_index: Some(neighbor.embedding.chunk_index),
                    similarity,
                    distance: neighbor.distance,
                    usage_score: usage,
                    combined_score: similarity + usage,
                    search_types: vec![SearchType::Semantic],
                    metadata: neighbor.embedding.metadata.clone(),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.combined_score
                .partial_cmp(&a.combined_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.document_id.cmp(&b.document_id))
        });
        hits.truncate(limit);
        hits
    }

    /// Fuse semantic and lexical hit sets by document.
    ///
    /// For each document the best-weighted hit is the representative;
    /// the combined score sums the weighted score of each search type
    /// and `search_types` records the union of sources.
    fn fuse(&self, semantic: Vec<SearchHit>, lexical: Vec<LexicalHit>) -> Vec<SearchHit> {
        struct FusedEntry {
            hit: SearchHit,
            best_weighted: f32,
            semantic_weighted: f32,
            lexical_weighted: f32,
        }

        let mut by_document: HashMap<Uuid, FusedEntry> = HashMap::new();

        for hit in semantic {
            let weighted = hit.combined_score * self.config.semantic_weight;
            let entry = by_document
                .entry(hit.document_id)
                .or_insert_with(|| FusedEntry {
                    hit: hit.clone(),
                    best_weighted: weighted,
                    semantic_weighted: weighted,
                    lexical_weighted: 0.0,
                });
            entry.semantic_weighted = entry.semantic_weighted.max(weighted);
            if weighted > entry.best_weighted {
                entry.best_weighted = weighted;
                entry.hit = hit;
            }
        }

        for lexical_hit in lexical {
            let weighted = lexical_hit.relevance * self.config.text_weight;
            let document_id = lexical_hit.document.id;

            match by_document.get_mut(&document_id) {
                Some(entry) => {
                    entry.lexical_weighted = entry.lexical_weighted.max(weighted);
                    if !entry.hit.search_types.contains(&SearchType::Lexical) {
                        entry.hit.search_types.push(SearchType::Lexical);
                    }
                    // The representative hit is whichever side weighed more.
                    if weighted > entry.best_weighted {
                        entry.best_weighted = weighted;
                        entry.hit =
                            lexical_search_hit(lexical_hit, entry.hit.search_types.clone());
                    }
                }
                None => {
                    by_document.insert(
                        document_id,
                        FusedEntry {
                            hit: lexical_search_hit(lexical_hit, vec![SearchType::Lexical]),
                            best_weighted: weighted,
                            semantic_weighted: 0.0,
                            lexical_weighted: weighted,
                        },
                    );
                }
            }
        }

        by_document
            .into_values()
            .map(|mut entry| {
                entry.hit.combined_score = entry.semantic_weighted + entry.lexical_weighted;
                if entry.semantic_weighted > 0.0
                    && !entry.hit.search_types.contains(&SearchType::Semantic)
                {
                    entry.hit.search_types.push(SearchType::Semantic);
                }
                entry.hit
            })
            .collect()
    }

    /// Batch usage update for every returned embedding.
    async fn record_returned(&self, hits: &[SearchHit]) -> Result<()> {
        let ids: Vec<Uuid> = hits.iter().filter_map(|h| h.embedding_id).collect();
        if ids.is_empty() {
            return Ok(());
        }
        self.store
            .record_usage(&ids, Utc::now())
            .await
            .map_err(Error::Storage)?;
        Ok(())
    }

    fn effective_limit(&self, options: &SearchOptions) -> usize {
        if options.limit == 0 {
            self.config.default_limit
        } else {
            options.limit
        }
    }
}

/// Build the hit shape for a lexical candidate.
fn lexical_search_hit(lexical_hit: LexicalHit, search_types: Vec<SearchType>) -> SearchHit {
    SearchHit {
        embedding_id: None,
        content: lexical_hit.snippet,
        document_id: lexical_hit.document.id,
        document_title: lexical_hit.document.title,
        document_location: lexical_hit.document.location,
        chunk_index: None,
        similarity: 0.0,
        distance: 0.0,
        usage_score: 0.0,
        combined_score: 0.0,
        search_types,
        metadata: Metadata::new(),
    }
}

/// Facet filters: AND-of-substring keyword matches, exact classification,
/// tag containment, and a created-at date range.
fn facet_matches(document: &Document, facets: &FacetFilters) -> bool {
    if !facets.keywords.is_empty() {
        let Some(keywords) = document.metadata.get("keywords").and_then(Value::as_array) else {
            return false;
        };
        let lowered: Vec<String> = keywords
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_lowercase)
            .collect();
        let all_match = facets.keywords.iter().all(|wanted| {
            let wanted = wanted.to_lowercase();
            lowered.iter().any(|k| k.contains(&wanted))
        });
        if !all_match {
            return false;
        }
    }

    if let Some(classification) = &facets.classification {
        let matches = document
            .metadata
            .get("classification")
            .and_then(Value::as_str)
            .is_some_and(|c| c == classification);
        if !matches {
            return false;
        }
    }

    if !facets.tags.is_empty() {
        let Some(tags) = document.metadata.get("tags").and_then(Value::as_array) else {
            return false;
        };
        let has_all = facets.tags.iter().all(|wanted| {
            tags.iter()
                .filter_map(Value::as_str)
                .any(|tag| tag == wanted)
        });
        if !has_all {
            return false;
        }
    }

    if let Some(after) = facets.created_after {
        if document.created_at < after {
            return false;
        }
    }
    if let Some(before) = facets.created_before {
        if document.created_at > before {
            return false;
        }
    }

    true
}
