use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub docs: DocsConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocsConfig {
    /// Root directory scanned (recursively) for documents.
    #[serde(default = "default_docs_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Target chunk length in characters; paragraphs merge up to this.
    #[serde(default = "default_chunk_target_chars")]
    pub chunk_target_chars: usize,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            root: default_docs_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            chunk_target_chars: default_chunk_target_chars(),
        }
    }
}

fn default_docs_root() -> PathBuf {
    PathBuf::from("data/docs")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.md".to_string(), "**/*.txt".to_string()]
}

fn default_chunk_target_chars() -> usize {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Master switch for retrieval grounding; off means bare LLM answers.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Snippet cap in characters; longer chunk text is cut with a marker.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
    /// Upper bound on the assembled context passed to the LLM.
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            top_k: default_top_k(),
            snippet_chars: default_snippet_chars(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

fn default_snippet_chars() -> usize {
    200
}

fn default_context_chars() -> usize {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// `"openai"` (any OpenAI-compatible endpoint) or `"mock"`.
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// The mock client is demo-only and must be opted into explicitly.
    #[serde(default)]
    pub allow_mock: bool,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: default_llm_base_url(),
            allow_mock: false,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Routes requests through the classify → dispatch → trace flow.
    #[serde(default)]
    pub enabled: bool,
    /// Queries containing any of these route to the graph tool.
    #[serde(default = "default_graph_keywords")]
    pub graph_keywords: Vec<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            graph_keywords: default_graph_keywords(),
        }
    }
}

fn default_graph_keywords() -> Vec<String> {
    [
        "graph",
        "subgraph",
        "neighbor",
        "path",
        "related to",
        "connected to",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Tokens starting with one of these prefixes are treated as node ids.
    #[serde(default = "default_node_prefixes")]
    pub node_prefixes: Vec<String>,
    /// Static edge list for the in-memory backend, as `[from, to]` pairs.
    #[serde(default)]
    pub edges: Vec<(String, String)>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            node_prefixes: default_node_prefixes(),
            edges: Vec::new(),
        }
    }
}

fn default_node_prefixes() -> Vec<String> {
    vec!["node".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7410".to_string()
}

impl Config {
    /// A default config for tests and config-less CLI runs.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if !(200..=500).contains(&config.docs.chunk_target_chars) {
        anyhow::bail!(
            "docs.chunk_target_chars must be in [200, 500], got {}",
            config.docs.chunk_target_chars
        );
    }

    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.snippet_chars == 0 {
        anyhow::bail!("retrieval.snippet_chars must be > 0");
    }
    if config.retrieval.context_chars < config.retrieval.snippet_chars {
        anyhow::bail!("retrieval.context_chars must be >= retrieval.snippet_chars");
    }

    match config.llm.provider.as_str() {
        "openai" | "mock" => {}
        other => anyhow::bail!("Unknown LLM provider: '{}'. Must be openai or mock.", other),
    }

    Ok(())
}
