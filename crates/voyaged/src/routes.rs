use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};
use voyage_core::{ErrorCategory, GameError, GameState, Step, StepOutcome};

use crate::state::AppState;

pub const SERVICE_NAME: &str = "voyaged";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/game/start", post(start_game))
        .route("/api/game/step", post(process_step))
        .route("/api/game/context/:session_id", get(context))
        .route("/api/game/history/:session_id", get(history))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepBody {
    input: Option<String>,
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ContextBody {
    context: GameState,
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    steps: Vec<Step>,
}

/// Error body returned by every failing route: `{"error": {"code", "message"}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCategory::SessionNotFound | ErrorCategory::StepNotFound => StatusCode::NOT_FOUND,
        ErrorCategory::ContextLimitExceeded => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::UpstreamFailure => StatusCode::BAD_GATEWAY,
        ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let category = err.category();
        let status = status_for(category);
        if status.is_server_error() {
            error!(%err, code = category.code(), "request failed");
        } else {
            warn!(%err, code = category.code(), "request rejected");
        }
        Self {
            status,
            code: category.code(),
            message: err.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": { "code": self.code, "message": self.message } });
        (self.status, Json(body)).into_response()
    }
}

async fn index() -> Json<Value> {
    Json(json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "game": "/api/game",
            "health": "/api/health"
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let generation = if state.orchestrator.generator_healthy().await {
        "reachable"
    } else {
        "unreachable"
    };
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "generation": generation
    }))
}

async fn start_game(State(state): State<AppState>) -> Result<Json<StepOutcome>, ApiError> {
    Ok(Json(state.orchestrator.start_game().await?))
}

async fn process_step(
    State(state): State<AppState>,
    payload: Result<Json<StepBody>, JsonRejection>,
) -> Result<Json<StepOutcome>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        warn!(%rejection, "unreadable step body");
        ApiError::bad_request("INVALID_INPUT", rejection.body_text())
    })?;
    let input = body
        .input
        .filter(|input| !input.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("INVALID_INPUT", "input is required"))?;
    let session_id = body
        .session_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("INVALID_SESSION", "sessionId is required"))?;
    Ok(Json(state.orchestrator.process_step(&session_id, &input).await?))
}

async fn context(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ContextBody>, ApiError> {
    let context = state.orchestrator.current_context(&session_id).await?;
    Ok(Json(ContextBody { context }))
}

async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryBody>, ApiError> {
    let steps = state.orchestrator.history(&session_id).await?;
    Ok(Json(HistoryBody { steps }))
}
