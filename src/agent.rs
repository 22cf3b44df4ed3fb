//! Agent routing: classify → dispatch → trace.
//!
//! The [`AgentRouter`] runs a small state machine per request: a pluggable
//! [`IntentClassifier`] maps the query to an [`Intent`], the [`Tool`] bound
//! to that intent runs, and every transition appends one [`TraceEntry`].
//! The trace is the component's observability contract: it is complete even
//! on failure — a failed dispatch records its error summary before the
//! router falls back to the text path.
//!
//! New tools attach by implementing [`Tool`]; the router dispatches by tool
//! name with no central conditional logic.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::error::PipelineError;
use crate::graph::{extract_node_id, GraphBackend};
use crate::models::{AnswerMode, Intent, PipelineResult, ResponseMeta, ScoredResult, TraceEntry};
use crate::pipeline::RagPipeline;

/// Cap for input/output summaries recorded in trace entries.
const SUMMARY_CHARS: usize = 160;

// ============ Classification ============

/// Capability interface for intent classification.
///
/// The shipped rule-based classifier is one configuration among future
/// alternatives; swapping it is a constructor argument, not a code change.
pub trait IntentClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, query: &str) -> Intent;
}

/// Deterministic keyword classifier. Ties and unknowns resolve to text.
pub struct RuleClassifier {
    graph_keywords: Vec<String>,
}

impl RuleClassifier {
    pub fn new(graph_keywords: &[String]) -> Self {
        Self {
            graph_keywords: graph_keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

impl IntentClassifier for RuleClassifier {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn classify(&self, query: &str) -> Intent {
        let lowered = query.to_lowercase();
        if self.graph_keywords.iter().any(|k| lowered.contains(k)) {
            Intent::Graph
        } else {
            Intent::Text
        }
    }
}

// ============ Tools ============

/// A capability the router can dispatch a classified request to.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, query: &str) -> Result<PipelineResult, PipelineError>;
}

/// Text retrieval tool wrapping the RAG pipeline.
pub struct TextRagTool {
    pipeline: Arc<RagPipeline>,
}

impl TextRagTool {
    pub fn new(pipeline: Arc<RagPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for TextRagTool {
    fn name(&self) -> &'static str {
        "text_rag"
    }

    async fn run(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        self.pipeline.run(query).await
    }
}

/// Graph lookup tool: resolves a node id from the query and reports its
/// 1-hop neighbors.
pub struct GraphTool {
    enabled: bool,
    backend: Arc<dyn GraphBackend>,
    node_prefixes: Vec<String>,
}

impl GraphTool {
    pub fn new(enabled: bool, backend: Arc<dyn GraphBackend>, node_prefixes: Vec<String>) -> Self {
        Self {
            enabled,
            backend,
            node_prefixes,
        }
    }
}

#[async_trait]
impl Tool for GraphTool {
    fn name(&self) -> &'static str {
        "graph"
    }

    async fn run(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        if !self.enabled {
            return Err(PipelineError::tool_failure(
                self.name(),
                "graph backend disabled",
            ));
        }

        let node_id = extract_node_id(query, &self.node_prefixes).ok_or_else(|| {
            PipelineError::tool_failure(
                self.name(),
                format!(
                    "no node id in query (expected a token prefixed with one of: {})",
                    self.node_prefixes.join(", ")
                ),
            )
        })?;

        let neighbors = self
            .backend
            .neighbors(&node_id)
            .map_err(|e| PipelineError::tool_failure(self.name(), e.to_string()))?;

        let answer = if neighbors.is_empty() {
            format!("No 1-hop neighbors found for {}.", node_id)
        } else {
            format!(
                "Found {} 1-hop neighbors of {}: {}.",
                neighbors.len(),
                node_id,
                neighbors.join(", ")
            )
        };

        let sources = vec![ScoredResult {
            chunk_id: node_id.clone(),
            doc_id: node_id.clone(),
            title: "graph_neighbors".to_string(),
            snippet: format!("neighbors={}", neighbors.len()),
            score: 1.0,
        }];

        Ok(PipelineResult {
            answer,
            sources,
            meta: ResponseMeta::new(AnswerMode::Graph, "none"),
            trace: Vec::new(),
        })
    }
}

// ============ Trace recording ============

struct TraceRecorder {
    entries: Vec<TraceEntry>,
    stage_started: Instant,
}

impl TraceRecorder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            stage_started: Instant::now(),
        }
    }

    fn record(&mut self, stage: &str, input_summary: String, output_summary: String) {
        let now = Instant::now();
        let elapsed_ms = now.duration_since(self.stage_started).as_millis() as u64;
        self.stage_started = now;
        self.entries.push(TraceEntry {
            step: self.entries.len() + 1,
            stage: stage.to_string(),
            input_summary,
            output_summary,
            elapsed_ms,
            timestamp: Utc::now(),
        });
    }

    fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }
}

fn summarize(text: &str) -> String {
    let flattened = text.replace('\n', " ");
    if flattened.chars().count() <= SUMMARY_CHARS {
        return flattened;
    }
    let cut: String = flattened.chars().take(SUMMARY_CHARS).collect();
    format!("{}…", cut.trim_end())
}

fn result_summary(result: &PipelineResult) -> String {
    format!(
        "sources={} answer={}",
        result.sources.len(),
        summarize(&result.answer)
    )
}

// ============ Router ============

pub struct AgentRouter {
    classifier: Box<dyn IntentClassifier>,
    tools: Vec<Arc<dyn Tool>>,
}

impl AgentRouter {
    pub fn new(classifier: Box<dyn IntentClassifier>, tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { classifier, tools }
    }

    fn tool_named(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    /// Handle one request through classify → dispatch → complete.
    ///
    /// Never returns an unhandled routing error: tool failures fall back to
    /// the text path with trace evidence. Only a terminal LLM failure (or a
    /// missing text tool, a wiring bug) propagates.
    pub async fn handle(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, "agent request");

        let mut trace = TraceRecorder::new();

        let intent = self.classifier.classify(query);
        trace.record(
            "classify",
            summarize(query),
            format!("intent={} classifier={}", intent.as_str(), self.classifier.name()),
        );

        let mut result = self.dispatch(intent, query, &mut trace).await.map_err(|err| {
            tracing::warn!(%request_id, error = %err, "agent request failed");
            err
        })?;

        result.meta.agent_enabled = true;
        result.meta.intent = Some(intent.as_str().to_string());
        trace.record(
            "complete",
            format!("intent={}", intent.as_str()),
            result_summary(&result),
        );
        result.trace = trace.into_entries();
        Ok(result)
    }

    async fn dispatch(
        &self,
        intent: Intent,
        query: &str,
        trace: &mut TraceRecorder,
    ) -> Result<PipelineResult, PipelineError> {
        let text_name = Intent::Text.tool_name();
        let mut routing_failure: Option<String> = None;

        if let Some(tool) = self.tool_named(intent.tool_name()) {
            match tool.run(query).await {
                Ok(mut result) => {
                    trace.record(
                        "dispatch",
                        format!("tool={}", tool.name()),
                        result_summary(&result),
                    );
                    result.meta.tool = Some(tool.name().to_string());
                    return Ok(result);
                }
                Err(err) if tool.name() != text_name => {
                    trace.record(
                        "dispatch",
                        format!("tool={}", tool.name()),
                        format!("error: {}", err),
                    );
                    routing_failure = Some(format!("{} dispatch failed, used text path", tool.name()));
                }
                Err(err) => {
                    // The text tool is the last resort; its errors are terminal
                    trace.record(
                        "dispatch",
                        format!("tool={}", tool.name()),
                        format!("error: {}", err),
                    );
                    return Err(err);
                }
            }
        } else {
            trace.record(
                "dispatch",
                format!("intent={}", intent.as_str()),
                format!("no tool bound, falling back to {}", text_name),
            );
            routing_failure = Some(format!(
                "no tool bound to intent {}, used text path",
                intent.as_str()
            ));
        }

        let text_tool = self.tool_named(text_name).ok_or_else(|| {
            PipelineError::tool_failure(text_name, "text tool not registered")
        })?;

        match text_tool.run(query).await {
            Ok(mut result) => {
                trace.record(
                    "fallback",
                    format!("tool={}", text_tool.name()),
                    result_summary(&result),
                );
                result.meta.tool = Some(text_tool.name().to_string());
                // The pipeline's own degradation note, when present, already
                // explains the final answer mode; otherwise record ours.
                if result.meta.fallback_reason.is_none() {
                    result.meta.fallback_reason = routing_failure;
                }
                Ok(result)
            }
            Err(err) => {
                trace.record(
                    "fallback",
                    format!("tool={}", text_tool.name()),
                    format!("error: {}", err),
                );
                Err(err)
            }
        }
    }
}
