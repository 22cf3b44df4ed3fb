//! HTTP boundary layer.
//!
//! Exposes the chat engine over a small JSON API:
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/chat` | Answer a message; body `{ "message": "..." }` |
//! | `GET`  | `/health` | Health check with corpus stats |
//!
//! The response body for `/chat` is the serialized [`PipelineResult`]:
//! `answer`, `sources` (`{doc_id, title, snippet, score}` and ids), `meta`
//! (`{mode, llm_provider, rag_enabled, agent_enabled, graph_enabled, ...}`),
//! and `trace` (ordered stage records). The core populates every field, so
//! this layer does no translation.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message is required" } }
//! ```
//!
//! Codes: `bad_request` (400), `llm_not_configured` (503), `llm_error`
//! (502), `internal` (500). Recoverable pipeline faults never surface here;
//! they come back as well-formed results with `meta.fallback_reason`.
//!
//! # Engine Lifecycle
//!
//! The engine builds lazily on the first request, guarded by a
//! `tokio::sync::OnceCell`: concurrent first arrivals await one build
//! instead of racing duplicate work, and the result is shared read-only
//! for the rest of the process.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::PipelineError;
use crate::models::PipelineResult;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    engine: Arc<OnceCell<Engine>>,
}

impl AppState {
    /// Build-once accessor for the engine; late arrivals await the same build.
    async fn engine(&self) -> Result<&Engine, AppError> {
        let config = self.config.clone();
        self.engine
            .get_or_try_init(|| async move { Engine::build((*config).clone()) })
            .await
            .map_err(|e| internal(format!("engine build failed: {}", e)))
    }
}

/// Start the HTTP server on the configured bind address.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();

    let state = AppState {
        config: Arc::new(config.clone()),
        engine: Arc::new(OnceCell::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    tracing::info!(bind = %bind_addr, "chat server listening");
    println!("Chat server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    hint: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
                hint: self.hint,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
        hint: None,
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
        hint: None,
    }
}

/// Map terminal pipeline errors to HTTP statuses. Recoverable kinds never
/// reach this function.
fn classify_pipeline_error(err: PipelineError) -> AppError {
    match err {
        PipelineError::NotConfigured(message) => AppError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            code: "llm_not_configured".to_string(),
            message,
            hint: Some(
                "Configure llm.provider = \"openai\" with OPENAI_API_KEY set, or enable \
                 demo mode with llm.provider = \"mock\" and llm.allow_mock = true."
                    .to_string(),
            ),
        },
        other => AppError {
            status: StatusCode::BAD_GATEWAY,
            code: "llm_error".to_string(),
            message: other.to_string(),
            hint: None,
        },
    }
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: Option<String>,
}

async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<PipelineResult>, AppError> {
    let message = request
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| bad_request("message is required"))?;

    let engine = state.engine().await?;
    let result = engine
        .chat(message)
        .await
        .map_err(classify_pipeline_error)?;

    Ok(Json(result))
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    documents: usize,
    chunks: usize,
    vectorizer: String,
    corpus_fingerprint: String,
    llm_provider: String,
}

async fn handle_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    let engine = state.engine().await?;
    let stats = engine.stats();
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        documents: stats.documents,
        chunks: stats.chunks,
        vectorizer: stats.vectorizer.to_string(),
        corpus_fingerprint: stats.fingerprint,
        llm_provider: engine.llm_provider().to_string(),
    }))
}
