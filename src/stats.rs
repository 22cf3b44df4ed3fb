//! Corpus statistics and document listing.
//!
//! Provides a quick summary of what's loaded: document and chunk counts,
//! the selected vectorizer, and the corpus fingerprint. Used by `gw stats`
//! and `gw docs` to give confidence that the retrieval set is what you
//! expect before serving traffic.

use anyhow::Result;

use crate::chunk::split_document;
use crate::config::Config;
use crate::engine::Engine;

/// Run the stats command: build the corpus and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let engine = Engine::build(config.clone())?;
    let stats = engine.stats();

    println!("Groundwork — Corpus Stats");
    println!("=========================");
    println!();
    println!("  Docs root:    {}", config.docs.root.display());
    println!("  Documents:    {}", stats.documents);
    println!("  Chunks:       {}", stats.chunks);
    println!("  Vectorizer:   {}", stats.vectorizer);
    println!("  Fingerprint:  {}", &stats.fingerprint[..16.min(stats.fingerprint.len())]);
    println!("  LLM provider: {}", engine.llm_provider());
    if let Some(err) = engine.llm_error() {
        println!("  LLM status:   unavailable ({})", err);
    }
    println!();

    Ok(())
}

/// Run the docs command: list loaded documents with chunk counts.
pub fn run_docs(config: &Config) -> Result<()> {
    let engine = Engine::build(config.clone())?;
    let documents = engine.documents();

    if documents.is_empty() {
        println!("No documents loaded from {}.", config.docs.root.display());
        return Ok(());
    }

    println!("  {:<28} {:>7}   {}", "DOC ID", "CHUNKS", "TITLE");
    println!("  {}", "-".repeat(64));
    for doc in documents {
        let chunks = split_document(doc, config.docs.chunk_target_chars).len();
        println!("  {:<28} {:>7}   {}", doc.doc_id, chunks, doc.title);
    }
    println!();
    println!("  {} documents", documents.len());

    Ok(())
}
