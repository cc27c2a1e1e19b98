use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use healthwatch_core::{CoreError, HealthStatus, ParamHealthReport};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::error::MonitorResult;
use crate::orchestrator::{HealthOrchestrator, TrialError};

/// Shared state available to all handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<HealthOrchestrator>,
}

/// Overall health response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Worst status across all parameters.
    pub status: HealthStatus,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub params: Vec<ParamHealthReport>,
}

/// GET /health -- overall status plus one report per parameter.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.orchestrator.overall_health_status().await;
    let params = state.orchestrator.health_status().await;

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        params,
    })
}

/// GET /health/errors -- last update error of every failing parameter.
async fn trial_errors(State(state): State<AppState>) -> Json<Vec<TrialError>> {
    Json(state.orchestrator.trial_errors().await)
}

/// GET /health/{param_id} -- report of a single parameter.
async fn param_health(
    State(state): State<AppState>,
    Path(param_id): Path<String>,
) -> MonitorResult<Json<ParamHealthReport>> {
    let report = state
        .orchestrator
        .health_status_with_param_id(&param_id)
        .await
        .ok_or(CoreError::ParamNotFound(param_id))?;
    Ok(Json(report))
}

/// Mount the health query routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/errors", get(trial_errors))
        .route("/health/{param_id}", get(param_health))
}

/// Build the full application with its middleware stack.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    router()
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500.
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
