//! Query and passage vectorization.
//!
//! Defines the [`Vectorizer`] trait and its two implementations:
//! - **[`TfidfVectorizer`]** — the statistical path: term-frequency ×
//!   inverse-document-frequency weights over a vocabulary fitted once per
//!   corpus, L2-normalized so cosine similarity reduces to a sparse dot
//!   product.
//! - **[`KeywordVectorizer`]** — the degraded mode: case-insensitive token
//!   sets scored by query coverage.
//!
//! # Vectorizer Selection
//!
//! Use [`select_vectorizer`] to run the capability probe once per store
//! build. The probe picks TF-IDF unless the fitted vocabulary is degenerate
//! (empty corpus, or every term filtered as a stop word); selection never
//! changes per request, so scores stay comparable across a process lifetime.
//!
//! # Coverage Asymmetry
//!
//! Keyword similarity is `|query ∩ passage| / |query|` — coverage of the
//! query, not symmetric Jaccard. A short query wholly contained in a passage
//! scores 1.0 on that passage regardless of the passage's length. This is a
//! deliberate degraded-mode choice: it favors passages that answer all of a
//! terse query over passages that merely share vocabulary.

use std::collections::{BTreeSet, HashMap};

/// Words excluded from the statistical vocabulary.
const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
    "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "my",
    "no", "not", "of", "on", "only", "or", "other", "our", "out", "she", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "to", "up",
    "was", "we", "were", "what", "when", "where", "which", "who", "will", "with", "would", "you",
    "your",
];

/// Sparse numeric representation of one text, tied to a fitted vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorRepr {
    /// L2-normalized `term-index → weight` map (statistical path).
    Weighted(HashMap<u32, f32>),
    /// Lowercase token set (degraded mode).
    TokenSet(BTreeSet<String>),
}

/// Capability interface for turning text into comparable vectors.
///
/// All chunks in one retriever share one fitted vectorizer; queries are
/// transformed against that same instance, never their own.
pub trait Vectorizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Vectorize one text against the fitted vocabulary.
    ///
    /// Transforming the same text twice yields identical representations.
    fn transform(&self, text: &str) -> VectorRepr;

    /// Score a query representation against a passage representation,
    /// in `[0.0, 1.0]`.
    fn similarity(&self, query: &VectorRepr, passage: &VectorRepr) -> f64;
}

/// Lowercase alphanumeric tokens of `text`, in order.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

// ============ Statistical path ============

/// TF-IDF vectorizer over a vocabulary fitted once per corpus.
///
/// Weights are `tf × (1 + ln((1 + N) / (1 + df)))`, L2-normalized per
/// vector, so the dot product of two representations is their cosine
/// similarity.
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, u32>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Fit a vocabulary over the corpus, excluding stop words.
    ///
    /// Returns `None` when the vocabulary is degenerate (no corpus, or
    /// every term stop-worded) — the caller falls back to keyword scoring.
    pub fn fit(corpus: &[String]) -> Option<Self> {
        let n_docs = corpus.len();
        if n_docs == 0 {
            return None;
        }

        let mut df: HashMap<String, usize> = HashMap::new();
        for text in corpus {
            let unique: BTreeSet<String> = tokenize(text)
                .into_iter()
                .filter(|t| !is_stop_word(t))
                .collect();
            for token in unique {
                *df.entry(token).or_insert(0) += 1;
            }
        }

        if df.is_empty() {
            return None;
        }

        // Sorted term order keeps index assignment deterministic
        let mut terms: Vec<(String, usize)> = df.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let mut vocabulary = HashMap::with_capacity(terms.len());
        let mut idf = Vec::with_capacity(terms.len());
        for (index, (term, term_df)) in terms.into_iter().enumerate() {
            vocabulary.insert(term, index as u32);
            idf.push(((1.0 + n_docs as f32) / (1.0 + term_df as f32)).ln() + 1.0);
        }

        Some(Self { vocabulary, idf })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn name(&self) -> &'static str {
        "tfidf"
    }

    fn transform(&self, text: &str) -> VectorRepr {
        let mut tf: HashMap<u32, f32> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *tf.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut weights: HashMap<u32, f32> = tf
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index as usize]))
            .collect();

        let norm: f32 = weights.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for weight in weights.values_mut() {
                *weight /= norm;
            }
        }

        VectorRepr::Weighted(weights)
    }

    fn similarity(&self, query: &VectorRepr, passage: &VectorRepr) -> f64 {
        match (query, passage) {
            (VectorRepr::Weighted(q), VectorRepr::Weighted(p)) => {
                // Iterate the smaller map
                let (small, large) = if q.len() <= p.len() { (q, p) } else { (p, q) };
                let dot: f32 = small
                    .iter()
                    .filter_map(|(index, w)| large.get(index).map(|v| w * v))
                    .sum();
                f64::from(dot).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

// ============ Degraded mode ============

/// Token-overlap vectorizer used when the statistical path is unavailable.
///
/// Stateless: there is no vocabulary to fit, so any corpus — including an
/// empty one — is accepted. Similarity is query coverage (see module docs
/// for the asymmetry).
pub struct KeywordVectorizer;

impl Vectorizer for KeywordVectorizer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn transform(&self, text: &str) -> VectorRepr {
        VectorRepr::TokenSet(tokenize(text).into_iter().collect())
    }

    fn similarity(&self, query: &VectorRepr, passage: &VectorRepr) -> f64 {
        match (query, passage) {
            (VectorRepr::TokenSet(q), VectorRepr::TokenSet(p)) => {
                if q.is_empty() {
                    return 0.0;
                }
                let overlap = q.intersection(p).count();
                overlap as f64 / q.len() as f64
            }
            _ => 0.0,
        }
    }
}

// ============ Capability probe ============

/// Pick the vectorizer for a corpus, once per store build.
///
/// Returns the selected vectorizer and, when the degraded mode was chosen,
/// the reason — surfaced downstream only as `meta.fallback_reason`, never
/// as an error.
pub fn select_vectorizer(corpus: &[String]) -> (Box<dyn Vectorizer>, Option<String>) {
    if corpus.is_empty() {
        return (
            Box::new(KeywordVectorizer),
            Some("empty corpus; keyword-overlap scoring in effect".to_string()),
        );
    }

    match TfidfVectorizer::fit(corpus) {
        Some(tfidf) => {
            tracing::debug!(vocabulary = tfidf.vocabulary_size(), "fitted tfidf vocabulary");
            (Box::new(tfidf), None)
        }
        None => {
            tracing::info!("tfidf vocabulary degenerate, switching to keyword-overlap scoring");
            (
                Box::new(KeywordVectorizer),
                Some("degenerate vocabulary; keyword-overlap scoring in effect".to_string()),
            )
        }
    }
}
