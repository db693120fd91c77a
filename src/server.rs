//! Read-only HTTP API.
//!
//! Exposes the reconciled listing view, the task category summary, and
//! source status as JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/owners/{owner}/listings` | Reconciled listings plus stats |
//! | `GET`  | `/owners/{owner}/tasks/summary` | Category counts (`?since=&until=`) |
//! | `GET`  | `/sources` | Configured sources and their health |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "invalid range: 'since' given without 'until'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `upstream_error` (502).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so dashboards can call
//! the API from the browser.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use goopss_core::{ListingView, TaskView};

use crate::config::Config;
use crate::listings::get_listing_view;
use crate::sources::{build_sources, get_sources, DataSources, SourceStatus};
use crate::tasks::{get_task_view, resolve_range};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    sources: DataSources,
}

/// Starts the HTTP server with sources built from `config`.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let sources = build_sources(config)?;
    run_server_with_sources(config, sources).await
}

/// Starts the HTTP server with caller-supplied sources.
///
/// Embedders and tests use this to serve in-memory or custom sources
/// instead of the ones described in `[sources.*]`.
///
/// ```rust,no_run
/// use goopss_harness::server::run_server_with_sources;
/// use goopss_harness::sources::DataSources;
/// use goopss_core::source::memory::InMemorySource;
/// use std::sync::Arc;
///
/// # async fn example(config: &goopss_harness::config::Config) -> anyhow::Result<()> {
/// let mem = Arc::new(InMemorySource::new());
/// let sources = DataSources {
///     listings: mem.clone(),
///     optimizations: mem.clone(),
///     tasks: mem,
/// };
/// run_server_with_sources(config, sources).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_sources(config: &Config, sources: DataSources) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let state = AppState {
        config: Arc::new(config.clone()),
        sources,
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind = %bind_addr, "HTTP server listening");
    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/owners/{owner}/listings", get(handle_listings))
        .route("/owners/{owner}/tasks/summary", get(handle_task_summary))
        .route("/sources", get(handle_sources))
        .layer(cors)
        .with_state(state)
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
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
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
    }
}

/// A data source failed; nothing partial is returned.
fn upstream_error(err: anyhow::Error) -> AppError {
    let message = format!("{:#}", err);
    tracing::warn!(error = %message, "upstream fetch failed");
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream_error".to_string(),
        message,
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /owners/{owner}/listings ============

async fn handle_listings(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<Json<ListingView>, AppError> {
    let view = get_listing_view(&state.sources, &owner)
        .await
        .map_err(upstream_error)?;
    Ok(Json(view))
}

// ============ GET /owners/{owner}/tasks/summary ============

#[derive(Deserialize)]
struct TaskSummaryQuery {
    since: Option<String>,
    until: Option<String>,
}

async fn handle_task_summary(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Query(query): Query<TaskSummaryQuery>,
) -> Result<Json<TaskView>, AppError> {
    let range = resolve_range(query.since.as_deref(), query.until.as_deref())
        .map_err(|e| bad_request(format!("{:#}", e)))?;

    let view = get_task_view(&state.sources, &owner, range)
        .await
        .map_err(upstream_error)?;
    Ok(Json(view))
}

// ============ GET /sources ============

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<SourceStatus>,
}

async fn handle_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: get_sources(&state.config),
    })
}
