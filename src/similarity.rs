//! Text similarity strategies for observation deduplication.
//!
//! Clustering only needs a yes/no answer, so the strategy seam is
//! `similar(a, b) -> bool`. The default scores normalized Levenshtein
//! distance against the configured threshold; the exact-match variant
//! backs the frequency-only degraded mode.

use crate::types::normalize_text;

/// Pluggable equivalence judgment between two observation texts.
pub trait Similarity: Send + Sync {
    fn similar(&self, a: &str, b: &str) -> bool;
}

/// Default strategy: normalized edit distance over canonical text.
pub struct NormalizedLevenshtein {
    threshold: f64,
}

impl NormalizedLevenshtein {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Similarity score in [0, 1]; 1.0 means identical canonical text.
    pub fn score(a: &str, b: &str) -> f64 {
        let a = normalize_text(a);
        let b = normalize_text(b);
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 1.0;
        }
        let distance = levenshtein_distance(&a, &b);
        1.0 - (distance as f64 / max_len as f64)
    }
}

impl Similarity for NormalizedLevenshtein {
    fn similar(&self, a: &str, b: &str) -> bool {
        Self::score(a, b) >= self.threshold
    }
}

/// Degraded-mode strategy: canonical texts must match exactly.
pub struct ExactMatch;

impl Similarity for ExactMatch {
    fn similar(&self, a: &str, b: &str) -> bool {
        normalize_text(a) == normalize_text(b)
    }
}

/// Classic two-row Levenshtein distance.
fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0usize; b_chars.len() + 1];

    for (i, &ac) in a_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &bc) in b_chars.iter().enumerate() {
            let cost = if ac == bc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
