//! Long-lived request-handling context.
//!
//! An [`Engine`] bundles everything one chat request needs: the loaded
//! corpus, the fitted retriever, the LLM client, the RAG pipeline, and the
//! agent router. It is built once from config and immutable afterwards, so
//! concurrent requests share it without locking (the server wraps it in an
//! `Arc` behind a one-time init guard).
//!
//! Dispatch order for a request mirrors the feature flags: retrieval off ⇒
//! bare LLM call; retrieval on, agent off ⇒ direct text-RAG; agent on ⇒
//! the full classify → dispatch → trace flow.

use anyhow::Result;
use std::sync::Arc;

use crate::agent::{AgentRouter, GraphTool, RuleClassifier, TextRagTool, Tool};
use crate::chunk::{corpus_fingerprint, split_corpus};
use crate::config::Config;
use crate::docs::load_documents;
use crate::error::PipelineError;
use crate::graph::StaticGraph;
use crate::llm::{build_client, LlmClient};
use crate::models::{Document, PipelineResult};
use crate::pipeline::RagPipeline;
use crate::retrieve::Retriever;

/// Corpus summary reported by `gw stats` and `GET /health`.
#[derive(Debug, Clone)]
pub struct CorpusStats {
    pub documents: usize,
    pub chunks: usize,
    pub vectorizer: &'static str,
    pub fingerprint: String,
}

pub struct Engine {
    config: Config,
    documents: Vec<Document>,
    retriever: Arc<Retriever>,
    pipeline: Option<Arc<RagPipeline>>,
    router: Option<AgentRouter>,
    llm_provider: String,
    /// Why no LLM client is available, when one could not be built.
    llm_error: Option<String>,
    fingerprint: String,
}

impl Engine {
    /// Load the corpus, fit the retriever, and wire up pipeline and router.
    ///
    /// A failed LLM client build does not abort the engine: the error is
    /// held and every chat request answers with `NotConfigured` until the
    /// configuration is fixed, so the server still starts and reports
    /// health.
    pub fn build(config: Config) -> Result<Self> {
        let documents = load_documents(&config.docs)?;
        let chunks = split_corpus(&documents, config.docs.chunk_target_chars);
        let fingerprint = corpus_fingerprint(&documents);

        tracing::info!(
            documents = documents.len(),
            chunks = chunks.len(),
            "corpus loaded"
        );

        let retriever = Arc::new(Retriever::build(chunks, config.retrieval.snippet_chars));
        if let Some(reason) = retriever.fallback_reason() {
            tracing::info!(reason, "retrieval running in degraded mode");
        }

        let (client, llm_provider, llm_error): (Option<Arc<dyn LlmClient>>, String, Option<String>) =
            match build_client(&config.llm) {
                Ok(client) => {
                    let provider = client.provider_name().to_string();
                    (Some(Arc::from(client)), provider, None)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "no LLM client available");
                    (None, "unconfigured".to_string(), Some(err.to_string()))
                }
            };

        let (pipeline, router) = match client {
            Some(client) => {
                let pipeline = Arc::new(RagPipeline::new(
                    retriever.clone(),
                    client,
                    config.retrieval.top_k,
                    config.retrieval.context_chars,
                ));

                let graph_backend = Arc::new(StaticGraph::from_config(&config.graph));
                let tools: Vec<Arc<dyn Tool>> = vec![
                    Arc::new(TextRagTool::new(pipeline.clone())),
                    Arc::new(GraphTool::new(
                        config.graph.enabled,
                        graph_backend,
                        config.graph.node_prefixes.clone(),
                    )),
                ];
                let router = AgentRouter::new(
                    Box::new(RuleClassifier::new(&config.agent.graph_keywords)),
                    tools,
                );
                (Some(pipeline), Some(router))
            }
            None => (None, None),
        };

        Ok(Self {
            config,
            documents,
            retriever,
            pipeline,
            router,
            llm_provider,
            llm_error,
            fingerprint,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            documents: self.documents.len(),
            chunks: self.retriever.chunk_count(),
            vectorizer: self.retriever.vectorizer_name(),
            fingerprint: self.fingerprint.clone(),
        }
    }

    pub fn llm_provider(&self) -> &str {
        &self.llm_provider
    }

    /// Why chat requests will fail, if the LLM client could not be built.
    pub fn llm_error(&self) -> Option<&str> {
        self.llm_error.as_deref()
    }

    /// Answer one chat message per the configured feature flags.
    pub async fn chat(&self, message: &str) -> Result<PipelineResult, PipelineError> {
        let pipeline = match (&self.pipeline, &self.llm_error) {
            (Some(pipeline), _) => pipeline,
            (None, reason) => {
                return Err(PipelineError::NotConfigured(
                    reason.clone().unwrap_or_else(|| "no LLM client".to_string()),
                ))
            }
        };

        let mut result = if !self.config.retrieval.enabled {
            pipeline.answer_ungrounded(message, None).await?
        } else if let Some(router) = self.router.as_ref().filter(|_| self.config.agent.enabled) {
            router.handle(message).await?
        } else {
            let mut result = pipeline.run(message).await?;
            result.meta.tool = Some("text_rag".to_string());
            result
        };

        result.meta.rag_enabled = self.config.retrieval.enabled;
        result.meta.agent_enabled = self.config.agent.enabled;
        result.meta.graph_enabled = self.config.graph.enabled;
        Ok(result)
    }
}
