//! Structure-aware chunking that follows paragraph boundaries.

use ragkit_core::{ChunkParams, Chunker};

use crate::sliding::SlidingChunker;

/// Paragraph-accumulating chunker.
///
/// Paragraphs are gathered into a chunk until adding the next one would
/// exceed the window; paragraphs larger than the window are split with the
/// sliding-window algorithm.
pub struct StructureChunker {
    fallback: SlidingChunker,
}

impl StructureChunker {
    /// Create a new structure-aware chunker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fallback: SlidingChunker::new(),
        }
    }
}

impl Default for StructureChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for StructureChunker {
    fn name(&self) -> &str {
        "structure"
    }

    fn chunk(&self, text: &str, params: &ChunkParams) -> Vec<String> {
        if text.trim().is_empty() {
            return vec![];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();

        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            let para_len = paragraph.chars().count();

            if para_len > params.chunk_size {
                // Flush what we have, then split the oversized paragraph.
                if !current.is_empty() {
                    chunks.push(std::mem::take(&mut current));
                }
                chunks.extend(self.fallback.chunk(paragraph, params));
                continue;
            }

            let current_len = current.chars().count();
            if current_len > 0 && current_len + 2 + para_len > params.chunk_size {
                chunks.push(std::mem::take(&mut current));
            }

            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }
}
