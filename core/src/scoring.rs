//! Pure scoring functions shared by extraction deduplication and hybrid
//! search: cosine similarity, a BM25-style lexical score, and reciprocal
//! rank fusion across rankings.

use std::collections::HashMap;

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

const BM25_K1: f32 = 1.2;
const BM25_B: f32 = 0.75;

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// BM25-style score of `document` against `query` within `corpus` (used for
/// idf/avgdl statistics). Documents and corpus should be the same textual
/// field across candidates (`fact` or `name`).
pub fn bm25_score(query: &str, document: &str, corpus: &[&str]) -> f32 {
    let query_terms = tokenize(query);
    if query_terms.is_empty() || corpus.is_empty() {
        return 0.0;
    }

    let doc_terms = tokenize(document);
    let doc_len = doc_terms.len() as f32;
    let avg_len = corpus.iter().map(|d| tokenize(d).len() as f32).sum::<f32>() / corpus.len() as f32;
    let avg_len = if avg_len == 0.0 { 1.0 } else { avg_len };

    let mut term_freq: HashMap<String, usize> = HashMap::new();
    for t in &doc_terms {
        *term_freq.entry(t.clone()).or_insert(0) += 1;
    }

    let n = corpus.len() as f32;
    let mut score = 0.0f32;
    for term in &query_terms {
        let df = corpus
            .iter()
            .filter(|d| tokenize(d).iter().any(|t| t == term))
            .count() as f32;
        let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
        let tf = *term_freq.get(term).unwrap_or(&0) as f32;
        let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * doc_len / avg_len);
        if denom > 0.0 {
            score += idf * (tf * (BM25_K1 + 1.0)) / denom;
        }
    }
    score
}

/// Reciprocal rank fusion: given several rankings of the same candidate
/// keys (best first), return a fused score per key, `sum(1/(k + rank))`.
pub fn reciprocal_rank_fusion<K: std::hash::Hash + Eq + Clone>(rankings: &[Vec<K>], k: f32) -> HashMap<K, f32> {
    let mut fused: HashMap<K, f32> = HashMap::new();
    for ranking in rankings {
        for (rank, key) in ranking.iter().enumerate() {
            *fused.entry(key.clone()).or_insert(0.0) += 1.0 / (k + rank as f32 + 1.0);
        }
    }
    fused
}

/// Rank a slice of `(key, score)` pairs best-first, returning just the keys.
pub fn rank_by_score<K: Clone>(scored: &[(K, f32)]) -> Vec<K> {
    let mut indices: Vec<usize> = (0..scored.len()).collect();
    indices.sort_by(|&i, &j| scored[j].1.partial_cmp(&scored[i].1).unwrap_or(std::cmp::Ordering::Equal));
    indices.into_iter().map(|i| scored[i].0.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_is_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn bm25_prefers_term_matching_document() {
        let corpus = ["the server crashed", "a cat sat on a mat", "the server rebooted"];
        let matching = bm25_score("server crashed", "the server crashed", &corpus);
        let non_matching = bm25_score("server crashed", "a cat sat on a mat", &corpus);
        assert!(matching > non_matching);
    }

    #[test]
    fn rrf_rewards_consistently_top_ranked_items() {
        let rankings = vec![vec!["a", "b", "c"], vec!["b", "a", "c"]];
        let fused = reciprocal_rank_fusion(&rankings, 60.0);
        assert!(fused["a"] > fused["c"]);
        assert!(fused["b"] > fused["c"]);
    }
}
