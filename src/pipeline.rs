//! The retrieval-grounded answer pipeline.
//!
//! [`RagPipeline::run`] retrieves top-K passages, assembles a bounded
//! context string with provenance markers, and calls the LLM client with
//! query plus context.
//!
//! The defining contract is the failure policy: any fault in retrieval,
//! context assembly, or the grounded LLM call downgrades the request to a
//! bare LLM call (`mode = "llm_only"`, empty sources, `fallback_reason`
//! set) instead of aborting it. Only a failure of that final bare call
//! crosses the boundary, as a typed [`PipelineError::LlmCall`].

use std::sync::Arc;

use crate::error::PipelineError;
use crate::llm::LlmClient;
use crate::models::{AnswerMode, PipelineResult, ResponseMeta, ScoredResult};
use crate::retrieve::Retriever;

/// Where the pipeline gets its passages.
///
/// [`Retriever`] is the production implementation; tests inject faulty
/// sources to exercise the degradation policy.
pub trait PassageSource: Send + Sync {
    fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredResult>>;

    /// Degraded-vectorization note to surface in `meta.fallback_reason`.
    fn degraded_reason(&self) -> Option<String> {
        None
    }
}

impl PassageSource for Retriever {
    fn retrieve(&self, query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredResult>> {
        Ok(Retriever::retrieve(self, query, top_k))
    }

    fn degraded_reason(&self) -> Option<String> {
        self.fallback_reason().map(|r| r.to_string())
    }
}

pub struct RagPipeline {
    source: Arc<dyn PassageSource>,
    client: Arc<dyn LlmClient>,
    top_k: usize,
    context_chars: usize,
}

impl RagPipeline {
    pub fn new(
        source: Arc<dyn PassageSource>,
        client: Arc<dyn LlmClient>,
        top_k: usize,
        context_chars: usize,
    ) -> Self {
        Self {
            source,
            client,
            top_k,
            context_chars,
        }
    }

    /// Answer a query grounded in retrieved passages.
    pub async fn run(&self, query: &str) -> Result<PipelineResult, PipelineError> {
        let sources = match self.source.retrieve(query, self.top_k) {
            Ok(sources) => sources,
            Err(err) => {
                tracing::warn!(error = %err, "retrieval failed, downgrading to llm_only");
                return self
                    .answer_ungrounded(query, Some(format!("retrieval failed: {}", err)))
                    .await;
            }
        };

        if sources.is_empty() {
            return self
                .answer_ungrounded(query, Some("no passages retrieved".to_string()))
                .await;
        }

        let context = build_context(&sources, self.context_chars);
        match self.client.generate(query, Some(&context)).await {
            Ok(answer) => {
                let mut meta = ResponseMeta::new(AnswerMode::TextRag, self.client.provider_name());
                meta.fallback_reason = self.source.degraded_reason();
                Ok(PipelineResult {
                    answer,
                    sources,
                    meta,
                    trace: Vec::new(),
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "grounded LLM call failed, downgrading to llm_only");
                self.answer_ungrounded(query, Some(format!("grounded LLM call failed: {}", err)))
                    .await
            }
        }
    }

    /// Bare LLM call with no retrieved context.
    ///
    /// `fallback_reason` is `Some` when this is a degradation rather than
    /// the configured llm-only mode. Failure here is terminal.
    pub async fn answer_ungrounded(
        &self,
        query: &str,
        fallback_reason: Option<String>,
    ) -> Result<PipelineResult, PipelineError> {
        let answer = self.client.generate(query, None).await?;
        let mut meta = ResponseMeta::new(AnswerMode::LlmOnly, self.client.provider_name());
        meta.fallback_reason = fallback_reason;
        Ok(PipelineResult {
            answer,
            sources: Vec::new(),
            meta,
            trace: Vec::new(),
        })
    }
}

/// Concatenate `[title] snippet` blocks up to the character budget.
///
/// The first block is always included, truncated to the budget if needed,
/// so the LLM sees at least one passage.
fn build_context(sources: &[ScoredResult], context_chars: usize) -> String {
    let mut context = String::new();
    for source in sources {
        let block = format!("[{}] {}", source.title, source.snippet);
        if context.is_empty() {
            if block.chars().count() > context_chars {
                let cut: String = block.chars().take(context_chars).collect();
                context.push_str(&cut);
            } else {
                context.push_str(&block);
            }
            continue;
        }
        if context.chars().count() + 1 + block.chars().count() > context_chars {
            break;
        }
        context.push('\n');
        context.push_str(&block);
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;

    struct ScriptedLlm {
        grounded_fails: bool,
        bare_fails: bool,
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _query: &str, context: Option<&str>) -> Result<String, LlmError> {
            let fails = if context.is_some() {
                self.grounded_fails
            } else {
                self.bare_fails
            };
            if fails {
                Err(LlmError::provider("scripted", "unavailable"))
            } else {
                Ok("scripted answer".to_string())
            }
        }
    }

    struct StaticSource {
        results: Vec<ScoredResult>,
        degraded: Option<String>,
    }

    impl PassageSource for StaticSource {
        fn retrieve(&self, _query: &str, top_k: usize) -> anyhow::Result<Vec<ScoredResult>> {
            Ok(self.results.iter().take(top_k).cloned().collect())
        }

        fn degraded_reason(&self) -> Option<String> {
            self.degraded.clone()
        }
    }

    struct FailingSource;

    impl PassageSource for FailingSource {
        fn retrieve(&self, _query: &str, _top_k: usize) -> anyhow::Result<Vec<ScoredResult>> {
            anyhow::bail!("index unavailable")
        }
    }

    fn result(doc_id: &str, score: f64) -> ScoredResult {
        ScoredResult {
            chunk_id: format!("{}#0", doc_id),
            doc_id: doc_id.to_string(),
            title: doc_id.to_string(),
            snippet: format!("snippet from {}", doc_id),
            score,
        }
    }

    fn pipeline(source: Arc<dyn PassageSource>, llm: ScriptedLlm) -> RagPipeline {
        RagPipeline::new(source, Arc::new(llm), 4, 2000)
    }

    #[tokio::test]
    async fn test_grounded_answer_with_sources() {
        let source = Arc::new(StaticSource {
            results: vec![result("a", 0.9), result("b", 0.4)],
            degraded: None,
        });
        let p = pipeline(
            source,
            ScriptedLlm {
                grounded_fails: false,
                bare_fails: false,
            },
        );

        let out = p.run("question").await.unwrap();
        assert_eq!(out.meta.mode, AnswerMode::TextRag);
        assert_eq!(out.sources.len(), 2);
        assert!(out.meta.fallback_reason.is_none());
        assert_eq!(out.answer, "scripted answer");
    }

    #[tokio::test]
    async fn test_retrieval_failure_downgrades_not_raises() {
        let p = pipeline(
            Arc::new(FailingSource),
            ScriptedLlm {
                grounded_fails: false,
                bare_fails: false,
            },
        );

        let out = p.run("question").await.unwrap();
        assert_eq!(out.meta.mode, AnswerMode::LlmOnly);
        assert!(out.sources.is_empty());
        assert!(out
            .meta
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("retrieval failed"));
    }

    #[tokio::test]
    async fn test_empty_retrieval_downgrades() {
        let p = pipeline(
            Arc::new(StaticSource {
                results: Vec::new(),
                degraded: Some("empty corpus; keyword-overlap scoring in effect".to_string()),
            }),
            ScriptedLlm {
                grounded_fails: false,
                bare_fails: false,
            },
        );

        let out = p.run("question").await.unwrap();
        assert_eq!(out.meta.mode, AnswerMode::LlmOnly);
        assert!(out.sources.is_empty());
        assert_eq!(
            out.meta.fallback_reason.as_deref(),
            Some("no passages retrieved")
        );
    }

    #[tokio::test]
    async fn test_grounded_llm_failure_falls_back_to_bare_call() {
        let p = pipeline(
            Arc::new(StaticSource {
                results: vec![result("a", 0.9)],
                degraded: None,
            }),
            ScriptedLlm {
                grounded_fails: true,
                bare_fails: false,
            },
        );

        let out = p.run("question").await.unwrap();
        assert_eq!(out.meta.mode, AnswerMode::LlmOnly);
        assert!(out
            .meta
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("grounded LLM call failed"));
    }

    #[tokio::test]
    async fn test_bare_call_failure_is_terminal() {
        let p = pipeline(
            Arc::new(FailingSource),
            ScriptedLlm {
                grounded_fails: true,
                bare_fails: true,
            },
        );

        let err = p.run("question").await.unwrap_err();
        assert!(matches!(err, PipelineError::LlmCall(_)));
    }

    #[tokio::test]
    async fn test_degraded_vectorizer_reason_survives_text_rag() {
        let p = pipeline(
            Arc::new(StaticSource {
                results: vec![result("a", 1.0)],
                degraded: Some("degenerate vocabulary; keyword-overlap scoring in effect".into()),
            }),
            ScriptedLlm {
                grounded_fails: false,
                bare_fails: false,
            },
        );

        let out = p.run("question").await.unwrap();
        assert_eq!(out.meta.mode, AnswerMode::TextRag);
        assert!(out
            .meta
            .fallback_reason
            .as_deref()
            .unwrap()
            .contains("degenerate vocabulary"));
    }

    #[test]
    fn test_build_context_bounded() {
        let sources: Vec<ScoredResult> = (0..50).map(|i| result(&format!("doc{}", i), 0.5)).collect();
        let context = build_context(&sources, 200);
        assert!(context.chars().count() <= 200);
        assert!(context.contains("[doc0]"));
    }

    #[test]
    fn test_build_context_always_includes_first_block() {
        let mut first = result("big", 1.0);
        first.snippet = "x".repeat(500);
        let context = build_context(&[first], 100);
        assert_eq!(context.chars().count(), 100);
    }
}
