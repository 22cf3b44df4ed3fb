//! LLM client abstraction and implementations.
//!
//! Defines the [`LlmClient`] capability and two concrete clients:
//! - **[`MockClient`]** — demo-only; stitches retrieved context into a
//!   canned reply. Gated behind `llm.allow_mock`.
//! - **[`HostedClient`]** — calls any OpenAI-compatible
//!   `POST {base_url}/chat/completions` endpoint with bearer auth.
//!
//! # Retry Strategy
//!
//! The hosted client retries exactly once, on HTTP 429, 5xx, and network
//! errors; other 4xx responses fail immediately. One bounded retry is the
//! ceiling — the pipeline's own degradation handles everything beyond it.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::LlmError;

/// Capability interface for answer generation.
///
/// `context` carries the assembled retrieval context, or `None` for a bare
/// (ungrounded) call.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn generate(&self, query: &str, context: Option<&str>) -> Result<String, LlmError>;
}

/// Build the configured client.
///
/// Fails with [`LlmError::Config`] when the provider is unknown, the mock
/// is requested without `allow_mock`, or the hosted provider has no API key.
pub fn build_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>, LlmError> {
    match config.provider.as_str() {
        "mock" => {
            if !config.allow_mock {
                return Err(LlmError::Config(
                    "mock provider is demo-only; set llm.allow_mock = true to enable".to_string(),
                ));
            }
            Ok(Box::new(MockClient))
        }
        "openai" => {
            let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
                LlmError::Config("OPENAI_API_KEY is required for provider=openai".to_string())
            })?;
            Ok(Box::new(HostedClient::new(config, api_key)?))
        }
        other => Err(LlmError::Config(format!("unsupported provider: {}", other))),
    }
}

// ============ Mock client ============

/// Demo-only client that echoes retrieved context into a reply.
pub struct MockClient;

#[async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, query: &str, context: Option<&str>) -> Result<String, LlmError> {
        let answer = match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => {
                let preview: String = context.chars().take(800).collect();
                format!("[DEMO MODE] Based on what I found: {}", preview)
            }
            None => format!(
                "[DEMO MODE] I could not find anything relevant. Echoing your question: {}",
                query
            ),
        };
        Ok(answer)
    }
}

// ============ Hosted client ============

/// Client for OpenAI-compatible chat-completions endpoints.
pub struct HostedClient {
    model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HostedClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        if api_key.is_empty() {
            return Err(LlmError::Config("API key must not be empty".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        })
    }

    fn build_prompt(query: &str, context: Option<&str>) -> String {
        match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => format!("Context:\n{}\n\nQuestion: {}", context, query),
            None => query.to_string(),
        }
    }

    async fn request_once(&self, prompt: &str) -> Result<String, LlmAttemptError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.2,
            "messages": [
                {
                    "role": "system",
                    "content": "You answer user questions. When context passages are \
                                provided, ground your answer in them and stay concise."
                },
                { "role": "user", "content": prompt }
            ]
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmAttemptError::Retryable(format!("network error: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(LlmAttemptError::Retryable(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(LlmAttemptError::Fatal(format!("HTTP {}", status)));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmAttemptError::Fatal(format!("invalid response body: {}", e)))?;

        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| LlmAttemptError::Fatal("response missing message content".to_string()))
    }
}

enum LlmAttemptError {
    Retryable(String),
    Fatal(String),
}

#[async_trait]
impl LlmClient for HostedClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, query: &str, context: Option<&str>) -> Result<String, LlmError> {
        let prompt = Self::build_prompt(query, context);

        match self.request_once(&prompt).await {
            Ok(answer) => Ok(answer),
            Err(LlmAttemptError::Fatal(message)) => Err(LlmError::provider("openai", message)),
            Err(LlmAttemptError::Retryable(first)) => {
                tracing::warn!(error = %first, "LLM request failed, retrying once");
                tokio::time::sleep(Duration::from_millis(500)).await;
                match self.request_once(&prompt).await {
                    Ok(answer) => Ok(answer),
                    Err(LlmAttemptError::Retryable(message))
                    | Err(LlmAttemptError::Fatal(message)) => {
                        Err(LlmError::provider("openai", message))
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_with_context() {
        let answer = MockClient
            .generate("what is this?", Some("[Intro] a retrieval service"))
            .await
            .unwrap();
        assert!(answer.starts_with("[DEMO MODE]"));
        assert!(answer.contains("retrieval service"));
    }

    #[tokio::test]
    async fn test_mock_without_context_echoes_question() {
        let answer = MockClient.generate("what is this?", None).await.unwrap();
        assert!(answer.starts_with("[DEMO MODE]"));
        assert!(answer.contains("what is this?"));
    }

    #[test]
    fn test_build_client_rejects_ungated_mock() {
        let config = LlmConfig {
            provider: "mock".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(build_client(&config), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_build_client_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "bert".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(build_client(&config), Err(LlmError::Config(_))));
    }

    #[test]
    fn test_prompt_includes_context_when_present() {
        let prompt = HostedClient::build_prompt("q?", Some("[T] snippet"));
        assert!(prompt.contains("Context:"));
        assert!(prompt.contains("Question: q?"));
        assert_eq!(HostedClient::build_prompt("q?", None), "q?");
    }
}
