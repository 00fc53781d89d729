//! Record mapping endpoints
//!
//! - `POST /mappings/auto`: run the Record Merger over the uploaded inputs
//! - `GET /mappings`: merged records keyed by identifier
//! - `PATCH /mappings/:id`: `{"field", "value"}` manual correction

use super::{parse_product_id, FieldEdit};
use crate::models::{FieldMap, ProductId};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Auto-map summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMapResponse {
    pub mapped: usize,
    pub with_labels: usize,
    pub database_only: usize,
    pub with_images: usize,
    /// Label/image identifiers with no database row
    pub orphans: Vec<ProductId>,
}

/// POST /mappings/auto
///
/// **Errors:**
/// - 400 Bad Request: database or labels not uploaded yet
pub async fn auto_map(State(state): State<AppState>) -> ApiResult<Json<AutoMapResponse>> {
    let outcome = state.pipeline.write().await.auto_map()?;

    Ok(Json(AutoMapResponse {
        mapped: outcome.mappings.len(),
        with_labels: outcome.with_labels,
        database_only: outcome.database_only,
        with_images: outcome.with_images,
        orphans: outcome.orphans,
    }))
}

/// GET /mappings
pub async fn list_mappings(State(state): State<AppState>) -> Json<BTreeMap<ProductId, FieldMap>> {
    let pipeline = state.pipeline.read().await;
    Json(
        pipeline
            .mappings()
            .iter()
            .map(|(id, record)| (id.clone(), record.fields.clone()))
            .collect(),
    )
}

/// PATCH /mappings/:id
///
/// **Errors:**
/// - 400 Bad Request: attempt to edit `id`
/// - 404 Not Found: no mapping for the identifier
pub async fn edit_mapping(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(edit): Json<FieldEdit>,
) -> ApiResult<Json<FieldMap>> {
    let id = parse_product_id(&raw_id)?;

    let mut pipeline = state.pipeline.write().await;
    let record = pipeline.edit_mapping(&id, &edit.field, edit.value)?;
    info!(product_id = %id, field = %edit.field, "Mapping edited");

    Ok(Json(record.fields.clone()))
}

/// Build mapping routes
pub fn mapping_routes() -> Router<AppState> {
    Router::new()
        .route("/mappings/auto", post(auto_map))
        .route("/mappings", get(list_mappings))
        .route("/mappings/:id", patch(edit_mapping))
}
