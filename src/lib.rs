//! # Groundwork
//!
//! A local-first retrieval-grounded question answering service.
//!
//! Groundwork answers natural-language questions by grounding an LLM call
//! in passages retrieved from a local directory of text/markdown documents,
//! with an optional agent layer that routes each request to a text-retrieval
//! tool or a graph-lookup tool and records a decision trace.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌───────────┐
//! │ Docs dir │──▶│ Chunk + Fit │──▶│ Retriever │
//! │ .md/.txt │   │ (tfidf/kw)  │   │  (top-K)  │
//! └──────────┘   └────────────┘   └─────┬─────┘
//!                                       │
//!              ┌────────────────────────┤
//!              ▼                        ▼
//!        ┌───────────┐           ┌────────────┐
//!        │ AgentRouter│──────────▶│ RagPipeline │──▶ LLM
//!        │ classify  │  dispatch │ context+call│
//!        └─────┬─────┘           └─────┬──────┘
//!              ▼                       ▼
//!         ┌─────────┐            ┌──────────┐
//!         │   CLI   │            │   HTTP   │
//!         │  (gw)   │            │  /chat   │
//!         └─────────┘            └──────────┘
//! ```
//!
//! Requests degrade instead of failing: a broken retrieval stage, an empty
//! corpus, or a failed graph dispatch all fall back toward a bare LLM call,
//! annotated in `meta.fallback_reason` and the trace.
//!
//! ## Quick Start
//!
//! ```bash
//! gw chat "What is in my notes?"   # one-shot question
//! gw stats                        # corpus summary
//! gw docs                         # list loaded documents
//! gw serve http                   # start the chat server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types and the response envelope |
//! | [`docs`] | Filesystem document loading |
//! | [`chunk`] | Paragraph-boundary chunking |
//! | [`vectorize`] | TF-IDF vectorization with keyword fallback |
//! | [`retrieve`] | Top-K similarity retrieval |
//! | [`llm`] | LLM client abstraction (mock, OpenAI-compatible) |
//! | [`pipeline`] | Retrieval-grounded answering with degradation |
//! | [`graph`] | 1-hop graph lookup collaborator |
//! | [`agent`] | Intent classification, tool dispatch, tracing |
//! | [`engine`] | Long-lived request-handling context |
//! | [`server`] | HTTP chat server |

pub mod agent;
pub mod chat_cmd;
pub mod chunk;
pub mod config;
pub mod docs;
pub mod engine;
pub mod error;
pub mod graph;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod retrieve;
pub mod server;
pub mod stats;
pub mod vectorize;
