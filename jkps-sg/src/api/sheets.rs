//! Product sheet endpoints
//!
//! Generation, review, direct edit, regeneration and reload of sheets.
//!
//! Long-running handlers snapshot the pipeline state under a short read
//! lock, run synthesis without holding any lock, then write the results
//! back under a short write lock.

use super::{parse_product_id, FieldEdit};
use crate::models::{FieldMap, ProductId};
use crate::workflow::SheetFailure;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Generation run summary
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub run_id: Uuid,
    pub generated: usize,
    /// Identifiers whose sheet was generated but not persisted
    pub failures: Vec<SheetFailure>,
}

/// Single sheet plus its persistence outcome
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetResponse {
    pub sheet: FieldMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist_error: Option<String>,
}

/// Reload summary
#[derive(Debug, Serialize)]
pub struct LoadResponse {
    pub loaded: usize,
}

/// POST /sheets/generate
///
/// **Errors:**
/// - 400 Bad Request: nothing mapped yet
///
/// Persistence failures do not fail the request; they are listed in
/// `failures` and recorded as the service's last error.
pub async fn generate_sheets(State(state): State<AppState>) -> ApiResult<Json<GenerateResponse>> {
    let input = state.pipeline.read().await.generation_input()?;

    let report = state.synthesizer.generate(input).await;
    let generated = report.sheets.len();

    state.pipeline.write().await.replace_sheets(report.sheets);

    if let Some(first) = report.failures.first() {
        state
            .record_error(format!(
                "{} sheet(s) not persisted in run {}: {}",
                report.failures.len(),
                report.run_id,
                first.message
            ))
            .await;
    }

    Ok(Json(GenerateResponse {
        run_id: report.run_id,
        generated,
        failures: report.failures,
    }))
}

/// POST /sheets/load
///
/// Replaces the in-memory sheets with the persisted collection.
pub async fn load_sheets(State(state): State<AppState>) -> ApiResult<Json<LoadResponse>> {
    let sheets = state.synthesizer.store().get_all().await?;
    let loaded = sheets.len();

    state.pipeline.write().await.replace_sheets(sheets);
    info!(loaded, "Sheets loaded from store");

    Ok(Json(LoadResponse { loaded }))
}

/// GET /sheets
pub async fn list_sheets(State(state): State<AppState>) -> Json<BTreeMap<ProductId, FieldMap>> {
    let pipeline = state.pipeline.read().await;
    Json(
        pipeline
            .sheets()
            .iter()
            .map(|(id, sheet)| (id.clone(), sheet.fields().clone()))
            .collect(),
    )
}

/// GET /sheets/:id
///
/// Sheets not held in memory are read from the store and cached, so a
/// persisted sheet stays reachable (and editable) without a full reload.
///
/// **Errors:**
/// - 404 Not Found: no sheet in memory or in the store
pub async fn get_sheet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<FieldMap>> {
    let id = parse_product_id(&raw_id)?;
    if let Some(sheet) = state.pipeline.read().await.sheet(&id) {
        return Ok(Json(sheet.fields().clone()));
    }

    let sheet = state
        .synthesizer
        .store()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No sheet for {}", id)))?;
    let fields = sheet.fields().clone();
    state.pipeline.write().await.put_sheet(sheet);
    debug!(product_id = %id, "Sheet read through from store");

    Ok(Json(fields))
}

/// PATCH /sheets/:id
///
/// Direct field edit, persisted to the store. A store failure is reported
/// in `persistError`; the in-memory edit stands.
///
/// **Errors:**
/// - 400 Bad Request: attempt to edit `id`
/// - 404 Not Found: no sheet for the identifier
pub async fn edit_sheet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(edit): Json<FieldEdit>,
) -> ApiResult<Json<SheetResponse>> {
    let id = parse_product_id(&raw_id)?;

    let sheet = state
        .pipeline
        .write()
        .await
        .edit_sheet(&id, &edit.field, edit.value)?;

    let persist_error = match state.synthesizer.store().put(&sheet).await {
        Ok(()) => None,
        Err(e) => {
            warn!(product_id = %id, error = %e, "Edited sheet not persisted");
            state.record_error(e.to_string()).await;
            Some(e.to_string())
        }
    };

    info!(product_id = %id, field = %edit.field, "Sheet edited");

    Ok(Json(SheetResponse {
        sheet: sheet.fields().clone(),
        persist_error,
    }))
}

/// POST /sheets/:id/regenerate
///
/// **Errors:**
/// - 404 Not Found: no mapping for the identifier
pub async fn regenerate_sheet(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<SheetResponse>> {
    let id = parse_product_id(&raw_id)?;
    let input = state.pipeline.read().await.regeneration_input(&id)?;

    let outcome = state.synthesizer.regenerate(input).await;

    state.pipeline.write().await.put_sheet(outcome.sheet.clone());

    if let Some(err) = &outcome.persist_error {
        state.record_error(err.clone()).await;
    }

    Ok(Json(SheetResponse {
        sheet: outcome.sheet.fields().clone(),
        persist_error: outcome.persist_error,
    }))
}

/// Build sheet routes
pub fn sheet_routes() -> Router<AppState> {
    Router::new()
        .route("/sheets/generate", post(generate_sheets))
        .route("/sheets/load", post(load_sheets))
        .route("/sheets", get(list_sheets))
        .route("/sheets/:id", get(get_sheet).patch(edit_sheet))
        .route("/sheets/:id/regenerate", post(regenerate_sheet))
}
