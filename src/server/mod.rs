//! HTTP entry point.
//!
//! - `POST /agent/invoke` runs the state machine for one thread
//! - `GET /agent/threads/{thread_id}` returns the latest stored state
//! - `GET /agent/boards/{thread_id}` returns the thread's project board
//! - `GET /health` liveness probe

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::checkpoint::CheckpointError;
use crate::conversation::{Message, Node};
use crate::orchestration::{OrchestrationError, Orchestrator, TurnOutcome};
use crate::tools::{BoardStore, ProjectBoard};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub boards: Arc<dyn BoardStore>,
}

/// Body of `POST /agent/invoke`.
///
/// Accepts the plain `{messages, thread_id}` shape and the LangServe-style
/// `{input: {messages}, config: {configurable: {thread_id}}}` shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum InvokeRequest {
    Direct {
        #[serde(default)]
        messages: Vec<Message>,
        thread_id: String,
    },
    LangServe {
        input: InvokeInput,
        config: InvokeConfig,
    },
}

#[derive(Debug, Deserialize)]
pub struct InvokeInput {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Deserialize)]
pub struct InvokeConfig {
    pub configurable: Configurable,
}

#[derive(Debug, Deserialize)]
pub struct Configurable {
    pub thread_id: String,
}

impl InvokeRequest {
    /// Whether the caller used the LangServe shape and expects an `output` envelope
    pub fn is_langserve(&self) -> bool {
        matches!(self, Self::LangServe { .. })
    }

    pub fn into_parts(self) -> (String, Vec<Message>) {
        match self {
            Self::Direct { messages, thread_id } => (thread_id, messages),
            Self::LangServe { input, config } => (config.configurable.thread_id, input.messages),
        }
    }
}

/// Response of `POST /agent/invoke`
#[derive(Debug, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub thread_id: String,
    pub checkpoint_id: String,
    pub next: Node,
    pub messages: Vec<Message>,
}

impl From<TurnOutcome> for InvokeResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            thread_id: outcome.thread_id,
            checkpoint_id: outcome.checkpoint_id,
            next: outcome.state.next,
            messages: outcome.state.messages,
        }
    }
}

/// Reply of `POST /agent/invoke`, shaped after the request
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InvokeReply {
    LangServe { output: InvokeResponse },
    Direct(InvokeResponse),
}

impl InvokeReply {
    pub fn into_inner(self) -> InvokeResponse {
        match self {
            Self::LangServe { output } => output,
            Self::Direct(response) => response,
        }
    }
}

/// Response of `GET /agent/threads/{thread_id}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ThreadStateResponse {
    pub thread_id: String,
    pub namespace: String,
    pub checkpoint_id: String,
    pub next: Node,
    pub messages: Vec<Message>,
    pub metadata: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
}

/// Error body `{"error": <kind>, "message": <text>}` with a matching status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            kind: "not_found",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

impl From<OrchestrationError> for ApiError {
    fn from(err: OrchestrationError) -> Self {
        let kind = err.kind();
        let status = match kind {
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            "corrupted_data" | "internal" => StatusCode::INTERNAL_SERVER_ERROR,
            "unrecognized_action" | "model_error" => StatusCode::BAD_GATEWAY,
            "invalid_request" => StatusCode::BAD_REQUEST,
            "step_limit" => StatusCode::LOOP_DETECTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            kind,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request",
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.kind, "message": self.message });
        (self.status, Json(body)).into_response()
    }
}

/// Build the router
pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/agent/invoke", post(invoke))
        .route("/agent/threads/{thread_id}", get(thread_state))
        .route("/agent/boards/{thread_id}", get(board))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Parsed origin allow-list, or `None` when `"*"` allows every origin.
///
/// An empty list yields an empty allow-list, so no cross-origin request passes.
fn allowed_origins(origins: &[String]) -> Option<Vec<HeaderValue>> {
    if origins.iter().any(|o| o == "*") {
        return None;
    }
    Some(
        origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect(),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = match allowed_origins(origins) {
        None => AllowOrigin::any(),
        Some(list) => {
            if list.is_empty() {
                tracing::info!("no CORS origins configured; cross-origin requests are refused");
            }
            AllowOrigin::list(list)
        }
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(addr: &str, state: AppState, cors_origins: &[String]) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "switchboard listening");
    axum::serve(listener, router(state, cors_origins)).await?;
    Ok(())
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn invoke(
    State(state): State<AppState>,
    body: Result<Json<InvokeRequest>, JsonRejection>,
) -> Result<Json<InvokeReply>, ApiError> {
    let Json(request) = body?;
    let langserve = request.is_langserve();
    let (thread_id, messages) = request.into_parts();
    let outcome = state.orchestrator.invoke(&thread_id, messages).await?;
    let response = InvokeResponse::from(outcome);
    Ok(Json(if langserve {
        InvokeReply::LangServe { output: response }
    } else {
        InvokeReply::Direct(response)
    }))
}

pub async fn thread_state(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ThreadStateResponse>, ApiError> {
    let snapshot = state
        .orchestrator
        .get_state(&thread_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no checkpoints for thread {}", thread_id)))?;

    Ok(Json(ThreadStateResponse {
        thread_id: snapshot.thread_id,
        namespace: snapshot.namespace,
        checkpoint_id: snapshot.checkpoint_id,
        next: snapshot.state.next,
        messages: snapshot.state.messages,
        metadata: snapshot.metadata,
        created_at: snapshot.created_at,
    }))
}

pub async fn board(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<ProjectBoard>, ApiError> {
    let board = state
        .boards
        .get_board(&thread_id)
        .await
        .map_err(|e| OrchestrationError::from(CheckpointError::from_store(e, &thread_id)))?;

    board
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no board for thread {}", thread_id)))
}
