//! Code-aware chunking that prefers definition and block boundaries.

use ragkit_core::{ChunkParams, Chunker};

use crate::sliding::find_break_point;

/// Line starts that open a new definition in common languages.
const DEFINITION_PREFIXES: &[&str] = &[
    "fn ", "pub fn ", "async fn ", "pub async fn ", "def ", "class ", "impl ", "struct ",
    "enum ", "trait ", "mod ", "function ", "interface ", "type ",
];

/// Chunker for source code.
///
/// Within each window the cut is searched backwards for a line that starts
/// a new definition or follows a closed block, before falling back to the
/// generic break-point preferences. As with the sliding chunker, the next
/// window starts `overlap` characters before the emitted cut, so no source
/// span between an early boundary and the next window is dropped.
pub struct CodeChunker;

impl CodeChunker {
    /// Create a new code-aware chunker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for CodeChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for CodeChunker {
    fn name(&self) -> &str {
        "code"
    }

    fn chunk(&self, text: &str, params: &ChunkParams) -> Vec<String> {
        if text.is_empty() {
            return vec![];
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total <= params.chunk_size {
            let trimmed = text.trim();
            return if trimmed.is_empty() {
                vec![]
            } else {
                vec![trimmed.to_string()]
            };
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + params.chunk_size).min(total);
            let cut = if end < total {
                find_code_break(&chars, start, end)
            } else {
                total
            };

            let chunk: String = chars[start..cut].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if cut >= total {
                break;
            }

            start = cut.saturating_sub(params.overlap).max(start + 1);
        }

        chunks
    }
}

/// Find a cut in `(start, end]`, preferring definition boundaries.
fn find_code_break(chars: &[char], start: usize, end: usize) -> usize {
    // Look for a line that opens a definition; cut just before it.
    let mut line_start = None;
    for i in (start + 1..end).rev() {
        if chars[i - 1] == '\n' && line_at_starts_definition(chars, i, end) {
            line_start = Some(i);
            break;
        }
    }
    if let Some(i) = line_start {
        // Keep the boundary only if it does not empty the window.
        if i > start + 1 {
            return i;
        }
    }

    // A closing brace alone on a line marks the end of a block.
    for i in (start + 1..end.saturating_sub(1)).rev() {
        if chars[i] == '}' && chars[i + 1] == '\n' {
            return (i + 2).min(end);
        }
    }

    find_break_point(chars, start, end)
}

/// Whether the line beginning at `i` starts with a definition keyword,
/// ignoring leading indentation.
fn line_at_starts_definition(chars: &[char], i: usize, end: usize) -> bool {
    let mut j = i;
    while j < end && (chars[j] == ' ' || chars[j] == '\t') {
        j += 1;
    }
    let rest: String = chars[j..end.min(j + 16)].iter().collect();
    DEFINITION_PREFIXES.iter().any(|p| rest.starts_with(p))
}
