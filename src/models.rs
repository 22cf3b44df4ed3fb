//! Core data models used throughout Groundwork.
//!
//! These types represent the documents, chunks, and scored passages that flow
//! through the retrieval pipeline, plus the response envelope (`answer` +
//! `sources` + `meta` + `trace`) that the HTTP layer serializes verbatim.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A source document loaded from the docs directory.
///
/// Immutable once loaded. Identity is `doc_id`, derived from the file's
/// path relative to the docs root (extension stripped, separators folded).
#[derive(Debug, Clone)]
pub struct Document {
    pub doc_id: String,
    pub title: String,
    /// Absolute path of the backing file; `None` for built-in documents.
    pub source_path: Option<String>,
    pub raw_text: String,
}

/// An addressable passage extracted from a document.
///
/// `ordinal` preserves source order within the document; `chunk_id` is
/// `"{doc_id}#{ordinal}"` and unique within one store instance.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub chunk_id: String,
    pub doc_id: String,
    pub title: String,
    pub text: String,
    pub ordinal: usize,
}

/// A retrieval hit: one chunk scored against a query.
///
/// `score` is in `[0, 1]`, rounded to 4 decimal places. Result lists are
/// ordered by non-increasing score; ties break on the chunk's ordinal.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredResult {
    pub chunk_id: String,
    pub doc_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f64,
}

/// How a request was ultimately answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Bare LLM call, no retrieved context.
    LlmOnly,
    /// Answer grounded in retrieved text passages.
    TextRag,
    /// Answer produced by the graph lookup tool.
    Graph,
}

/// Response metadata, serialized into the HTTP body as `meta`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub mode: AnswerMode,
    pub llm_provider: String,
    pub rag_enabled: bool,
    pub agent_enabled: bool,
    pub graph_enabled: bool,
    /// Why the request was degraded, when it was. First trigger wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
}

impl ResponseMeta {
    /// Fresh metadata for a result produced by the core pipeline.
    ///
    /// The feature flags start out `false`; the engine stamps the real
    /// values from config before the result crosses the HTTP boundary.
    pub fn new(mode: AnswerMode, llm_provider: impl Into<String>) -> Self {
        Self {
            mode,
            llm_provider: llm_provider.into(),
            rag_enabled: false,
            agent_enabled: false,
            graph_enabled: false,
            fallback_reason: None,
            intent: None,
            tool: None,
        }
    }
}

/// One audit record of a routing or pipeline stage.
///
/// Entries are appended in call order and never mutated; the sequence is
/// the sole mechanism for reconstructing a request's decision path.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub step: usize,
    pub stage: String,
    pub input_summary: String,
    pub output_summary: String,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// The complete result of one chat request.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub answer: String,
    pub sources: Vec<ScoredResult>,
    pub meta: ResponseMeta,
    pub trace: Vec<TraceEntry>,
}

/// Classified query intent. Derived per request, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    Graph,
    Text,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Graph => "graph",
            Intent::Text => "text",
        }
    }

    /// Name of the tool bound to this intent.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Intent::Graph => "graph",
            Intent::Text => "text_rag",
        }
    }
}
