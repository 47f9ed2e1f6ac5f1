//! Chunker registry for strategy selection.

use ragkit_core::{ChunkParams, Chunker};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of chunking strategies with a default.
pub struct ChunkerRegistry {
    chunkers: HashMap<String, Arc<dyn Chunker>>,
    default: Option<String>,
}

impl ChunkerRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunkers: HashMap::new(),
            default: None,
        }
    }

    /// Registry preloaded with the standard strategies, sliding as default.
    #[must_use]
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(crate::SlidingChunker::new());
        registry.register(crate::StructureChunker::new());
        registry.register(crate::CodeChunker::new());
        registry.set_default("sliding");
        registry
    }

    /// Register a chunker under its own name.
    pub fn register<C: Chunker + 'static>(&mut self, chunker: C) {
        self.chunkers
            .insert(chunker.name().to_string(), Arc::new(chunker));
    }

    /// Set the default strategy by name.
    pub fn set_default(&mut self, name: &str) {
        if self.chunkers.contains_key(name) {
            self.default = Some(name.to_string());
        }
    }

    /// Get a chunker by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Chunker>> {
        self.chunkers.get(name).cloned()
    }

    /// Chunk with the named strategy, falling back to the default.
    pub fn chunk(&self, strategy: Option<&str>, text: &str, params: &ChunkParams) -> Vec<String> {
        let chunker = strategy
            .and_then(|name| self.get(name))
            .or_else(|| self.default.as_deref().and_then(|name| self.get(name)));

        match chunker {
            Some(c) => c.chunk(text, params),
            None => vec![],
        }
    }
}

impl Default for ChunkerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SlidingChunker;

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ChunkerRegistry::new();
        assert!(registry.get("sliding").is_none());
    }

    #[test]
    fn test_standard_registry_has_all_strategies() {
        let registry = ChunkerRegistry::standard();
        assert!(registry.get("sliding").is_some());
        assert!(registry.get("structure").is_some());
        assert!(registry.get("code").is_some());
    }

    #[test]
    fn test_default_strategy_used_when_unnamed() {
        let registry = ChunkerRegistry::standard();
        let chunks = registry.chunk(None, "hello world", &ChunkParams::default());
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_unknown_strategy_falls_back_to_default() {
        let registry = ChunkerRegistry::standard();
        let chunks = registry.chunk(Some("nope"), "hello", &ChunkParams::default());
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_no_default_no_chunker_yields_empty() {
        let registry = ChunkerRegistry::new();
        let chunks = registry.chunk(None, "hello", &ChunkParams::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_set_default_requires_registered_name() {
        let mut registry = ChunkerRegistry::new();
        registry.set_default("sliding");
        assert!(registry.default.is_none());

        registry.register(SlidingChunker::new());
        registry.set_default("sliding");
        assert_eq!(registry.default.as_deref(), Some("sliding"));
    }
}
