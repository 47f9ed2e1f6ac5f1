//! Deterministic, provider-free fallbacks.
//!
//! When no provider is configured or a call fails, the gateway degrades to
//! these implementations: an extractive sentence-boundary summarizer, a
//! stop-word-filtered frequency keyword extractor, and a hashed
//! pseudo-embedding of the configured dimension. All three are pure
//! functions of their input.

use std::collections::HashMap;

/// Common English stop words excluded from keyword extraction.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "for", "from", "had",
    "has", "have", "he", "her", "his", "i", "in", "is", "it", "its", "not", "of", "on",
    "or", "our", "she", "that", "the", "their", "them", "there", "these", "they", "this",
    "to", "was", "we", "were", "which", "will", "with", "you", "your",
];

/// Produce a deterministic pseudo-embedding of the given dimension.
///
/// Bytes of the input are folded into vector slots and the result is
/// L2-normalized. Identical text always yields an identical vector, so
/// fallback search still ranks exact-duplicate content highest.
pub fn pseudo_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vector = vec![0.0_f32; dimension];
    if text.is_empty() || dimension == 0 {
        return vector;
    }

    for (idx, byte) in text.bytes().enumerate() {
        let slot = idx % dimension;
        vector[slot] += f32::from(byte) / 255.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }

    vector
}

/// Extractive summary: whole sentences accumulated up to `max_length`.
///
/// Sentences are taken in document order. If even the first sentence is
/// longer than the budget it is hard-truncated so the summary is never
/// empty for non-empty input.
pub fn extractive_summary(text: &str, max_length: usize) -> String {
    let text = text.trim();
    if text.is_empty() || max_length == 0 {
        return String::new();
    }

    let mut summary = String::new();
    for sentence in split_sentences(text) {
        let sep = if summary.is_empty() { 0 } else { 1 };
        if summary.len() + sep + sentence.len() > max_length {
            break;
        }
        if sep == 1 {
            summary.push(' ');
        }
        summary.push_str(sentence);
    }

    if summary.is_empty() {
        summary = text.chars().take(max_length).collect();
    }

    summary
}

/// Frequency-ranked keywords, stop-word filtered and de-duplicated.
///
/// Ties keep first-occurrence order, so the output is stable across runs.
pub fn frequency_keywords(text: &str, max: usize) -> Vec<String> {
    if text.is_empty() || max == 0 {
        return vec![];
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for token in text.split(|c: char| !c.is_alphanumeric()) {
        let word = token.to_lowercase();
        if word.len() < 2 || STOP_WORDS.contains(&word.as_str()) {
            continue;
        }
        let count = counts.entry(word.clone()).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = order
        .into_iter()
        .enumerate()
        .map(|(first_seen, word)| {
            let count = counts[&word];
            (word, count, first_seen)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.into_iter().take(max).map(|(w, _, _)| w).collect()
}

/// Split text into sentences at terminator-plus-whitespace boundaries.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;

    for (i, &b) in bytes.iter().enumerate() {
        if matches!(b, b'.' | b'!' | b'?') {
            let at_end = i + 1 == bytes.len();
            let before_space = !at_end && bytes[i + 1].is_ascii_whitespace();
            if at_end || before_space {
                let sentence = text[start..=i].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = i + 1;
            }
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }

    sentences
}
