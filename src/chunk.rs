//! Paragraph-boundary text chunker.
//!
//! Splits a document's body into [`Chunk`]s that respect a configurable
//! target length. Splitting occurs on blank-line paragraph boundaries,
//! merging short paragraphs until the target is reached so chunk boundaries
//! never cut mid-sentence when avoidable. A paragraph longer than the target
//! is hard-split at the nearest newline or space boundary.
//!
//! A document with zero usable text yields zero chunks; downstream
//! components treat an empty chunk set as "no knowledge available".

use sha2::{Digest, Sha256};

use crate::models::{Chunk, Document};

/// Split a document into chunks with contiguous ordinals starting at 0.
pub fn split_document(doc: &Document, target_chars: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut current_buf = String::new();
    let mut ordinal = 0usize;

    let mut flush = |buf: &mut String, ordinal: &mut usize, chunks: &mut Vec<Chunk>| {
        if !buf.is_empty() {
            chunks.push(make_chunk(doc, *ordinal, buf));
            *ordinal += 1;
            buf.clear();
        }
    };

    for para in doc.raw_text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // +2 for the \n\n separator when the buffer is non-empty
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > target_chars && !current_buf.is_empty() {
            flush(&mut current_buf, &mut ordinal, &mut chunks);
        }

        if trimmed.len() > target_chars {
            flush(&mut current_buf, &mut ordinal, &mut chunks);

            let mut remaining = trimmed;
            while !remaining.is_empty() {
                let split_at = floor_char_boundary(remaining, target_chars.min(remaining.len()));
                let actual_split = if split_at < remaining.len() {
                    remaining[..split_at]
                        .rfind('\n')
                        .or_else(|| remaining[..split_at].rfind(' '))
                        .map(|pos| pos + 1)
                        .unwrap_or(split_at)
                } else {
                    split_at
                };
                let piece = remaining[..actual_split].trim();
                if !piece.is_empty() {
                    chunks.push(make_chunk(doc, ordinal, piece));
                    ordinal += 1;
                }
                remaining = &remaining[actual_split..];
            }
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    flush(&mut current_buf, &mut ordinal, &mut chunks);

    chunks
}

/// Split a whole corpus, preserving document order.
///
/// Ordinals restart per document; chunk ids stay unique because they
/// embed the doc id.
pub fn split_corpus(documents: &[Document], target_chars: usize) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| split_document(doc, target_chars))
        .collect()
}

/// SHA-256 fingerprint over document ids and raw text, for staleness checks.
pub fn corpus_fingerprint(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.doc_id.as_bytes());
        hasher.update([0]);
        hasher.update(doc.raw_text.as_bytes());
        hasher.update([0]);
    }
    format!("{:x}", hasher.finalize())
}

fn make_chunk(doc: &Document, ordinal: usize, text: &str) -> Chunk {
    Chunk {
        chunk_id: format!("{}#{}", doc.doc_id, ordinal),
        doc_id: doc.doc_id.clone(),
        title: doc.title.clone(),
        text: text.to_string(),
        ordinal,
    }
}

/// Largest index `<= at` that lands on a UTF-8 char boundary.
fn floor_char_boundary(s: &str, at: usize) -> usize {
    let mut idx = at.min(s.len());
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_doc(text: &str) -> Document {
        Document {
            doc_id: "doc1".to_string(),
            title: "Doc One".to_string(),
            source_path: None,
            raw_text: text.to_string(),
        }
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = split_document(&make_doc("Hello, world!"), 400);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[0].chunk_id, "doc1#0");
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text_yields_zero_chunks() {
        assert!(split_document(&make_doc(""), 400).is_empty());
        assert!(split_document(&make_doc("  \n\n  \n"), 400).is_empty());
    }

    #[test]
    fn test_multiple_paragraphs_under_limit_merge() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = split_document(&make_doc(text), 400);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("First paragraph."));
        assert!(chunks[0].text.contains("Third paragraph."));
    }

    #[test]
    fn test_multiple_paragraphs_exceed_limit() {
        let text = (0..30)
            .map(|i| format!("Paragraph number {} with a little padding text.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = split_document(&make_doc(&text), 200);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.ordinal, i, "ordinal mismatch at position {}", i);
            assert_eq!(c.chunk_id, format!("doc1#{}", i));
        }
    }

    #[test]
    fn test_oversized_paragraph_hard_split() {
        let text = "word ".repeat(200); // one 1000-char paragraph, no blank lines
        let chunks = split_document(&make_doc(text.trim()), 200);
        assert!(chunks.len() >= 4);
        for c in &chunks {
            assert!(c.text.len() <= 200, "chunk over target: {}", c.text.len());
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let c1 = split_document(&make_doc(text), 250);
        let c2 = split_document(&make_doc(text), 250);
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.text, b.text);
            assert_eq!(a.chunk_id, b.chunk_id);
        }
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let a = vec![make_doc("one")];
        let b = vec![make_doc("two")];
        assert_ne!(corpus_fingerprint(&a), corpus_fingerprint(&b));
        assert_eq!(corpus_fingerprint(&a), corpus_fingerprint(&a));
    }
}
