//! Built-in demo bus.
//!
//! Serves two services with one capability each, enough to watch a full
//! pass end to end (`harvest mock-bus` in one shell, `harvest serve` in
//! another). Also used by the integration tests.

use axum::{
    extract::Path,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

/// Router answering the bus protocol for `svc-a` and `svc-b`.
pub fn router() -> Router {
    Router::new()
        .route("/bus/services", get(services))
        .route("/services/{id}/capabilities", get(capabilities))
        .route("/services/svc-a/telemetry", get(telemetry_a))
        .route("/services/svc-b/alerts", get(alerts_b))
}

/// Serve the demo bus on an already-bound listener.
pub async fn serve(listener: TcpListener) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("demo bus listening on http://{}", addr);
    }
    axum::serve(listener, router()).await?;
    Ok(())
}

async fn services() -> Json<Value> {
    Json(json!([{"id": "svc-a"}, {"id": "svc-b"}]))
}

async fn capabilities(Path(id): Path<String>) -> Result<Json<Value>, StatusCode> {
    let endpoints = match id.as_str() {
        "svc-a" => json!([{"rel": "telemetry", "href": "/services/svc-a/telemetry"}]),
        "svc-b" => json!([{"rel": "alerts", "href": "/services/svc-b/alerts"}]),
        _ => return Err(StatusCode::NOT_FOUND),
    };
    Ok(Json(json!({ "endpoints": endpoints })))
}

async fn telemetry_a() -> Json<Value> {
    Json(json!([{"timestamp": "2025-08-18T10:00:00Z", "value": 42}]))
}

async fn alerts_b() -> Json<Value> {
    Json(json!({"timestamp": "2025-08-18T10:00:10Z", "value": "HIGH"}))
}
