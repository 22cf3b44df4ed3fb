//! Failure taxonomy for the chat pipeline.
//!
//! Recoverable failures (unreadable files, degraded vectorization, retrieval
//! faults, routing faults) are absorbed at the component that can degrade
//! gracefully and surface only through `meta.fallback_reason` and the trace.
//! The boundary layer only ever sees `LlmCall` (an LLM call that failed
//! after degradation was already attempted) and `NotConfigured` (no usable
//! client could be built); `ToolFailure` is absorbed by the router's
//! fallback path.

use thiserror::Error;

/// Typed errors crossing component boundaries inside the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The LLM call failed with no further degradation possible. Terminal.
    #[error("LLM call failed: {0}")]
    LlmCall(#[from] LlmError),

    /// No usable LLM client could be built from configuration. Terminal.
    #[error("LLM provider not configured: {0}")]
    NotConfigured(String),

    /// A routed tool could not produce a result. The router degrades to
    /// the text path; this never reaches the boundary layer.
    #[error("tool '{tool}' failed: {message}")]
    ToolFailure { tool: String, message: String },
}

impl PipelineError {
    pub fn tool_failure(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailure {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by an LLM client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Invalid or incomplete provider configuration.
    #[error("invalid LLM configuration: {0}")]
    Config(String),

    /// The provider rejected the request or was unreachable.
    #[error("provider '{provider}' request failed: {message}")]
    Provider { provider: String, message: String },
}

impl LlmError {
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
