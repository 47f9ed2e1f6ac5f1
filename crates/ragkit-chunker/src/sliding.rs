//! Sliding-window chunking with backward break-point search.

use ragkit_core::{ChunkParams, Chunker};

/// Sliding-window chunker with configurable overlap.
///
/// Windows are measured in characters. Within each window the break point
/// is searched backwards from the window end: paragraph break first, then
/// sentence terminator followed by whitespace, then any whitespace, then a
/// hard cut at the window boundary.
///
/// The next window starts `overlap` characters before the emitted cut,
/// not before the nominal window end: consecutive chunks always share
/// exactly `overlap` characters of emitted text and no span between an
/// early break point and the next window is ever dropped, so
/// concatenating chunks (ignoring overlaps) recovers the input. Advancing
/// is guarded so the window always moves forward even when
/// `overlap >= chunk_size`.
pub struct SlidingChunker;

impl SlidingChunker {
    /// Create a new sliding-window chunker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for SlidingChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker for SlidingChunker {
    fn name(&self) -> &str {
        "sliding"
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
                find_break_point(&chars, start, end)
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

            // Forward-progress guard for overlap >= chunk_size.
            start = cut.saturating_sub(params.overlap).max(start + 1);
        }

        chunks
    }
}

/// Find a break point in `(start, end]`, searched backwards from `end`.
///
/// Preference order: paragraph break, sentence terminator followed by
/// whitespace, any whitespace. Falls back to `end` (hard cut).
pub(crate) fn find_break_point(chars: &[char], start: usize, end: usize) -> usize {
    // Paragraph break: cut after the blank line.
    for i in (start + 1..end).rev() {
        if chars[i - 1] == '\n' && chars[i] == '\n' {
            return i + 1;
        }
    }

    // Sentence terminator followed by whitespace: cut after the terminator.
    for i in (start..end.saturating_sub(1)).rev() {
        if matches!(chars[i], '.' | '!' | '?') && chars[i + 1].is_whitespace() {
            return i + 1;
        }
    }

    // Any whitespace: cut after it.
    for i in (start + 1..end).rev() {
        if chars[i].is_whitespace() {
            return i + 1;
        }
    }

    end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
        SlidingChunker::new().chunk(text, &ChunkParams::new(chunk_size, overlap))
    }

    #[test]
    fn test_empty_text_yields_no_chunks() {
        assert!(chunk("", 1000, 200).is_empty());
    }

    #[test]
    fn test_whitespace_only_yields_no_chunks() {
        assert!(chunk("   \n\n  ", 1000, 200).is_empty());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk("  hello world.  ", 1000, 200);
        assert_eq!(chunks, vec!["hello world.".to_string()]);
    }

    #[test]
    fn test_hard_cut_with_overlap() {
        let text = "A".repeat(1500);
        let chunks = chunk(&text, 1000, 200);

        assert!(chunks.len() >= 2);
        assert!(chunks[0].len() <= 1000);
        // The first 200 chars of chunk 2 repeat the last 200 of chunk 1.
        let tail: String = chunks[0].chars().rev().take(200).collect();
        let head: String = chunks[1].chars().take(200).collect();
        assert_eq!(tail, head);
    }

    #[test]
    fn test_overlap_ge_chunk_size_terminates() {
        let text = "B".repeat(500);
        // overlap >= chunk_size must still make forward progress
        let chunks = chunk(&text, 100, 150);
        assert!(!chunks.is_empty());
        assert!(chunks.len() < text.len());
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let first = "First paragraph sentence one. Sentence two here as well.";
        let text = format!("{first}\n\nSecond paragraph with more words following after it.");
        let chunks = chunk(&text, 70, 10);

        assert!(chunks.len() >= 2);
        assert_eq!(chunks[0], first);
    }

    #[test]
    fn test_prefers_sentence_break_over_whitespace() {
        let text = "One short sentence ends here. Another sentence keeps going with words";
        let chunks = chunk(&text, 45, 5);

        assert!(chunks.len() >= 2);
        assert!(chunks[0].ends_with('.'), "got {:?}", chunks[0]);
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let text = "wordswithoutperiods and more words without any terminator present";
        let chunks = chunk(&text, 30, 5);

        assert!(chunks.len() >= 2);
        // Cut lands after whitespace, not mid-word.
        assert_eq!(chunks[0], "wordswithoutperiods and more");
    }

    #[test]
    fn test_round_trip_covers_all_text() {
        let text = "The quick brown fox. Jumps over the lazy dog! Again and again? \
                    More filler sentences to force several windows in this text. "
            .repeat(10);
        let chunks = chunk(&text, 120, 0);

        // With zero overlap, concatenating chunks recovers the original
        // modulo whitespace normalization.
        let joined: String = chunks.join(" ");
        let norm = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(norm(&joined), norm(&text));
    }

    #[test]
    fn test_unicode_is_not_split_mid_char() {
        let text = "héllo wörld 世界 ".repeat(100);
        let chunks = chunk(&text, 50, 10);
        assert!(!chunks.is_empty());
        // Reconstructible implies no broken code points.
        for c in &chunks {
            assert!(c.chars().count() <= 50);
        }
    }

    #[test]
    fn test_zero_chunk_size_uses_defaults() {
        let text = "C".repeat(1500);
        let chunks = SlidingChunker::new().chunk(&text, &ChunkParams::new(0, 0));
        // Defaults 1000/200 apply.
        assert!(chunks.len() >= 2);
        assert!(chunks[0].len() <= 1000);
    }

    #[test]
    fn test_chunker_name() {
        assert_eq!(SlidingChunker::new().name(), "sliding");
    }

    #[test]
    fn test_find_break_point_paragraph() {
        let chars: Vec<char> = "one\n\ntwo".chars().collect();
        assert_eq!(find_break_point(&chars, 0, 7), 5);
    }

    #[test]
    fn test_find_break_point_sentence() {
        let chars: Vec<char> = "Stop. go on".chars().collect();
        assert_eq!(find_break_point(&chars, 0, 9), 5);
    }

    #[test]
    fn test_find_break_point_hard_cut() {
        let chars: Vec<char> = "abcdefghij".chars().collect();
        assert_eq!(find_break_point(&chars, 0, 5), 5);
    }
}
