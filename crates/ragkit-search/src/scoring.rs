//! Scoring reference functions.

use chrono::{DateTime, Utc};

/// Usage counts saturate the frequency score at this value.
const FREQUENCY_SATURATION: f64 = 100.0;
/// Recency decays with this half-life-style constant, in days.
const RECENCY_DECAY_DAYS: f64 = 30.0;

/// Cosine similarity: `dot(a,b) / (||a|| * ||b||)`.
///
/// Returns 0 for empty, zero-magnitude, or mismatched-length inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Usage score: weighted frequency and recency of an embedding's retrieval.
///
/// `frequency = min(ln(count + 1) / ln(100), 1)`; recency decays
/// exponentially with the days since the embedding was last returned.
/// Never-returned embeddings score 0.
pub fn usage_score(
    usage_count: u64,
    returned_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    frequency_weight: f32,
    recency_weight: f32,
) -> f32 {
    let Some(returned_at) = returned_at else {
        return 0.0;
    };
    if usage_count == 0 {
        return 0.0;
    }

    let frequency = (((usage_count as f64) + 1.0).ln() / FREQUENCY_SATURATION.ln()).min(1.0);

    let days_since = (now - returned_at).num_seconds().max(0) as f64 / 86_400.0;
    let recency = (-days_since / RECENCY_DECAY_DAYS).exp();

    frequency_weight * frequency as f32 + recency_weight * recency as f32
}
