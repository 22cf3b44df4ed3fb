//! Similarity-ranked passage retrieval.
//!
//! A [`Retriever`] owns the chunk set, the vectorizer selected by the
//! capability probe, and one pre-computed vector per chunk. Retrieval
//! scores every chunk against the query, sorts by score descending with a
//! stable tie-break on source order, and truncates to `top_k`.
//!
//! A retriever over zero chunks returns an empty result list — never an
//! error.

use crate::models::{Chunk, ScoredResult};
use crate::vectorize::{select_vectorizer, VectorRepr, Vectorizer};

pub struct Retriever {
    chunks: Vec<Chunk>,
    vectorizer: Box<dyn Vectorizer>,
    vectors: Vec<VectorRepr>,
    fallback_reason: Option<String>,
    snippet_chars: usize,
}

impl Retriever {
    /// Fit the vectorizer over the chunk texts and pre-compute one vector
    /// per chunk. Chunks are kept in the order given; that order is the
    /// tie-break for equal scores.
    pub fn build(chunks: Vec<Chunk>, snippet_chars: usize) -> Self {
        let corpus: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let (vectorizer, fallback_reason) = select_vectorizer(&corpus);
        let vectors = chunks
            .iter()
            .map(|c| vectorizer.transform(&c.text))
            .collect();

        Self {
            chunks,
            vectorizer,
            vectors,
            fallback_reason,
            snippet_chars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// `"tfidf"` or `"keyword"`, fixed at build time.
    pub fn vectorizer_name(&self) -> &'static str {
        self.vectorizer.name()
    }

    /// Why the degraded vectorizer was selected, if it was.
    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    /// Rank all chunks against the query and return the top `top_k`.
    ///
    /// Scores are rounded to 4 decimal places and clamped to `[0, 1]`.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<ScoredResult> {
        if self.chunks.is_empty() {
            return Vec::new();
        }
        let top_k = top_k.max(1);

        let query_vec = self.vectorizer.transform(query);

        let mut scored: Vec<(usize, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, passage)| (i, self.vectorizer.similarity(&query_vec, passage)))
            .collect();

        // Stable sort: equal scores keep source order (ordinal tie-break)
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                ScoredResult {
                    chunk_id: chunk.chunk_id.clone(),
                    doc_id: chunk.doc_id.clone(),
                    title: chunk.title.clone(),
                    snippet: make_snippet(&chunk.text, self.snippet_chars),
                    score: round_score(score),
                }
            })
            .collect()
    }
}

/// First `max_chars` of the text on a char boundary, with a truncation
/// marker when cut.
fn make_snippet(text: &str, max_chars: usize) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let cut: String = flattened.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

fn round_score(score: f64) -> f64 {
    (score.clamp(0.0, 1.0) * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn chunk(doc_id: &str, ordinal: usize, text: &str) -> Chunk {
        Chunk {
            chunk_id: format!("{}#{}", doc_id, ordinal),
            doc_id: doc_id.to_string(),
            title: doc_id.to_string(),
            text: text.to_string(),
            ordinal,
        }
    }

    #[test]
    fn test_empty_store_returns_empty() {
        let retriever = Retriever::build(Vec::new(), 200);
        assert!(retriever.retrieve("anything", 5).is_empty());
        assert_eq!(retriever.vectorizer_name(), "keyword");
        assert!(retriever.fallback_reason().is_some());
    }

    #[test]
    fn test_returns_at_most_top_k_sorted() {
        let chunks = vec![
            chunk("a", 0, "rust retrieval engine for local documents"),
            chunk("b", 0, "cooking recipes and kitchen notes"),
            chunk("c", 0, "retrieval quality metrics for engines"),
            chunk("d", 0, "gardening through the seasons"),
        ];
        let retriever = Retriever::build(chunks, 200);

        let results = retriever.retrieve("retrieval engine", 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
        for r in &results {
            assert!(r.score >= 0.0 && r.score <= 1.0);
        }
    }

    #[test]
    fn test_relevant_chunk_ranks_first() {
        let chunks = vec![
            chunk("other", 0, "totally unrelated content goes here"),
            chunk("hit", 0, "groundwork is a retrieval grounded chat service"),
        ];
        let retriever = Retriever::build(chunks, 200);
        let results = retriever.retrieve("what is groundwork", 2);
        assert_eq!(results[0].doc_id, "hit");
        assert!(results[0].score > 0.0);
    }

    #[test]
    fn test_tie_break_preserves_source_order() {
        // Identical chunks score identically; source order must hold
        let chunks = vec![
            chunk("a", 0, "identical passage text"),
            chunk("a", 1, "identical passage text"),
            chunk("a", 2, "identical passage text"),
        ];
        let retriever = Retriever::build(chunks, 200);
        let results = retriever.retrieve("identical passage", 3);
        let ids: Vec<&str> = results.iter().map(|r| r.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a#0", "a#1", "a#2"]);
    }

    #[test]
    fn test_top_k_zero_clamped_to_one() {
        let chunks = vec![chunk("a", 0, "some passage")];
        let retriever = Retriever::build(chunks, 200);
        assert_eq!(retriever.retrieve("some passage", 0).len(), 1);
    }

    #[test]
    fn test_snippet_truncation_marker() {
        let long = "word ".repeat(100);
        let snippet = make_snippet(&long, 20);
        assert!(snippet.ends_with('…'));
        assert!(snippet.chars().count() <= 21);

        let short = make_snippet("short text", 20);
        assert_eq!(short, "short text");
    }

    #[test]
    fn test_keyword_fallback_order_matches_coverage() {
        // A corpus whose every term is a stop word forces the keyword path
        let chunks = vec![
            chunk("a", 0, "that was then"),
            chunk("b", 0, "this is the other"),
        ];
        let retriever = Retriever::build(chunks, 200);
        assert_eq!(retriever.vectorizer_name(), "keyword");

        // "this other" is fully covered by chunk b, half covered by none
        let results = retriever.retrieve("this other", 2);
        assert_eq!(results[0].doc_id, "b");
        assert!((results[0].score - 1.0).abs() < 1e-9);
        assert_eq!(results[1].score, 0.0);
    }

    #[test]
    fn test_end_to_end_with_chunker() {
        let doc = Document {
            doc_id: "intro".to_string(),
            title: "Intro".to_string(),
            source_path: None,
            raw_text: "Groundwork answers questions from local documents.".to_string(),
        };
        let chunks = crate::chunk::split_document(&doc, 400);
        let retriever = Retriever::build(chunks, 200);
        let results = retriever.retrieve("What does groundwork answer?", 4);
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.0);
    }
}
