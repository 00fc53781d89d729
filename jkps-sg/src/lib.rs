//! jkps-sg library interface
//!
//! Product sheet generator: reconciles a product database, garment label
//! texts and product images into persisted product sheets, exposed over HTTP.

pub mod api;
pub mod db;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod models;
pub mod services;
pub mod types;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use crate::db::SqliteSheetStore;
use crate::models::{Locale, IMAGES_URL_PREFIX};
use crate::workflow::{PipelineState, SheetSynthesizer};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (settings, product sheets)
    pub db: SqlitePool,
    /// Session pipeline state; never held across derivation or persistence awaits
    pub pipeline: Arc<RwLock<PipelineState>>,
    /// Sheet synthesis with its injected collaborators and store
    pub synthesizer: SheetSynthesizer,
    /// Directory holding uploaded images, served under `/images`
    pub images_dir: PathBuf,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    /// State with the SQLite sheet store and local derivation
    pub fn new(db: SqlitePool, images_dir: PathBuf, locale: Locale) -> Self {
        let store = Arc::new(SqliteSheetStore::new(db.clone()));
        Self::with_synthesizer(db, images_dir, locale, SheetSynthesizer::with_store(store))
    }

    /// State with a custom synthesizer (external services, alternate store)
    pub fn with_synthesizer(
        db: SqlitePool,
        images_dir: PathBuf,
        locale: Locale,
        synthesizer: SheetSynthesizer,
    ) -> Self {
        Self {
            db,
            pipeline: Arc::new(RwLock::new(PipelineState::new(locale))),
            synthesizer,
            images_dir,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember a non-fatal failure for `/health`
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let images = ServeDir::new(&state.images_dir);

    Router::new()
        .merge(api::health_routes())
        .merge(api::settings_routes())
        .merge(api::upload_routes())
        .merge(api::mapping_routes())
        .merge(api::sheet_routes())
        .merge(api::export_routes())
        .nest_service(IMAGES_URL_PREFIX, images)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
