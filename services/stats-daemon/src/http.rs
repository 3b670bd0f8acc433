//! JSON endpoints over the accumulated statistics.
//!
//! - `GET /json/paths`      — per-znode-path counters
//! - `GET /json/ips`        — per-client-address counters
//! - `GET /json/auths`      — per-auth-credential counters
//! - `GET /json/auths-dump` — per-auth per-path request counts
//! - `GET /json/info`       — daemon identity and totals
//! - `GET /json/health`     — always ok while the process runs

use crate::accumulators::StatsAccumulator;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub stats: Arc<Mutex<StatsAccumulator>>,
    pub version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/json/paths", get(paths))
        .route("/json/ips", get(ips))
        .route("/json/auths", get(auths))
        .route("/json/auths-dump", get(auths_dump))
        .route("/json/info", get(info))
        .route("/json/health", get(health))
        .with_state(state)
}

async fn paths(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.stats.lock().await;
    Json(serde_json::json!(stats.paths()))
}

async fn ips(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.stats.lock().await;
    Json(serde_json::json!(stats.ips()))
}

async fn auths(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.stats.lock().await;
    Json(serde_json::json!(stats.auths()))
}

async fn auths_dump(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.stats.lock().await;
    Json(serde_json::json!(stats.auth_paths()))
}

async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.stats.lock().await;
    Json(serde_json::json!(stats.info(state.version)))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
