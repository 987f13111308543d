//! Query HTTP server.
//!
//! Serves the accumulated records as JSON while the polling scheduler runs
//! in a background task on the same runtime.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/data` | All records, or only `?kind=<kind>` |
//! | `POST` | `/admin/clear` | Empty the store |
//!
//! A failed poll pass never turns into an error here; the API simply serves
//! whatever has been accumulated so far.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so dashboards can read
//! `/data` straight from the browser.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::Config;
use crate::discovery::DiscoveryWalker;
use crate::fetch::HttpFetcher;
use crate::models::Record;
use crate::scheduler::Scheduler;
use crate::store::RecordStore;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: RecordStore,
}

/// Starts the scheduler and the query server described by `config`.
///
/// The first poll pass begins immediately. Runs until the server stops,
/// then aborts the scheduler task.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = RecordStore::new();
    let fetcher = HttpFetcher::new(config.poll.timeout())?;
    let walker = DiscoveryWalker::new(config.bus.clone(), Arc::new(fetcher), store.clone());
    let scheduler = Scheduler::new(walker, config.poll.interval());

    info!(bus = %config.bus.base(), "polling bus");
    let poller = tokio::spawn(scheduler.run());

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    let result = serve(listener, store).await;

    poller.abort();
    result
}

/// Serve the query API for `store` on an already-bound listener.
pub async fn serve(listener: TcpListener, store: RecordStore) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("query API listening on http://{}", addr);
    }
    axum::serve(listener, router(store)).await?;
    Ok(())
}

/// Build the query router over `store`.
pub fn router(store: RecordStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/data", get(handle_data))
        .route("/admin/clear", post(handle_clear))
        .layer(cors)
        .with_state(AppState { store })
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    /// Always `"ok"` while the process is up.
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /data ============

#[derive(Deserialize)]
struct DataQuery {
    kind: Option<String>,
}

/// An empty `kind` is treated the same as no filter.
async fn handle_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Json<Vec<Record>> {
    let records = match query.kind.as_deref() {
        Some(kind) if !kind.is_empty() => state.store.list_by_kind(kind),
        _ => state.store.list_all(),
    };
    Json(records)
}

// ============ POST /admin/clear ============

#[derive(Serialize)]
struct ClearResponse {
    cleared: bool,
}

async fn handle_clear(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.store.clear();
    info!(removed, "record store cleared");
    Json(ClearResponse { cleared: true })
}
