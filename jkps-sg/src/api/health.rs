//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Module name ("jkps-sg")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Pipeline contents held in memory
    pub pipeline: PipelineCounts,
    /// Last non-fatal error, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Sizes of each pipeline stage held in memory
#[derive(Debug, Serialize)]
pub struct PipelineCounts {
    pub locale: String,
    pub database_records: usize,
    pub labels: usize,
    pub images: usize,
    pub mappings: usize,
    pub sheets: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let pipeline = {
        let pipeline = state.pipeline.read().await;
        PipelineCounts {
            locale: pipeline.locale().code().to_string(),
            database_records: pipeline.database().map_or(0, |rows| rows.len()),
            labels: pipeline.labels().len(),
            images: pipeline.images().len(),
            mappings: pipeline.mappings().len(),
            sheets: pipeline.sheets().len(),
        }
    };
    let last_error = state.last_error.read().await.clone();

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "jkps-sg".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        pipeline,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
