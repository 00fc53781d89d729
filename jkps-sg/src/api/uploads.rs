//! Input upload endpoints
//!
//! - `POST /uploads/database`: CSV body, replaces the database records
//! - `POST /uploads/labels`: `{"files": [{"name", "content"}]}`
//! - `PUT /uploads/images/:file_name`: raw image bytes

use crate::extractors::{import_database, DatabaseImportOptions, LabelExtractor, LabelSource};
use crate::models::ImageReference;
use crate::services::{release_image, write_image};
use crate::{ApiResult, AppState};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Upper bound for one uploaded file
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Database upload summary
#[derive(Debug, Serialize)]
pub struct DatabaseUploadResponse {
    pub records: usize,
}

/// One label text file
#[derive(Debug, Deserialize)]
pub struct LabelFile {
    pub name: String,
    pub content: String,
}

/// Label upload request
#[derive(Debug, Deserialize)]
pub struct LabelUploadRequest {
    pub files: Vec<LabelFile>,
}

/// Label upload summary
#[derive(Debug, Serialize)]
pub struct LabelUploadResponse {
    /// Records extracted from this batch
    pub extracted: usize,
    /// Label records held after the upload
    pub total: usize,
    /// Files without a product identifier
    pub misses: Vec<String>,
}

/// POST /uploads/database
///
/// **Errors:**
/// - 400 Bad Request: malformed CSV or missing `id` column (nothing replaced)
pub async fn upload_database(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<DatabaseUploadResponse>> {
    let records = import_database(body.as_ref(), DatabaseImportOptions::default())?;
    let count = records.len();

    state.pipeline.write().await.replace_database(records);

    Ok(Json(DatabaseUploadResponse { records: count }))
}

/// POST /uploads/labels
///
/// Each file is parsed on its own; files without an identifier are reported
/// in `misses` and the rest of the batch is kept.
pub async fn upload_labels(
    State(state): State<AppState>,
    Json(payload): Json<LabelUploadRequest>,
) -> ApiResult<Json<LabelUploadResponse>> {
    let sources = payload.files.into_iter().map(|f| LabelSource {
        name: f.name,
        content: f.content,
    });
    let batch = LabelExtractor::new().extract_batch(sources);
    let extracted = batch.records.len();

    let total = {
        let mut pipeline = state.pipeline.write().await;
        pipeline.add_labels(batch.records);
        pipeline.labels().len()
    };

    if !batch.misses.is_empty() {
        state
            .record_error(format!(
                "No product identifier in label file(s): {}",
                batch.misses.join(", ")
            ))
            .await;
    }

    info!(extracted, misses = batch.misses.len(), total, "Labels uploaded");

    Ok(Json(LabelUploadResponse {
        extracted,
        total,
        misses: batch.misses,
    }))
}

/// PUT /uploads/images/:file_name
///
/// A later image for the same identifier supersedes the earlier one, whose
/// file is deleted.
///
/// **Errors:**
/// - 400 Bad Request: file name with path separators or without identifier
pub async fn upload_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ImageReference>> {
    let reference = write_image(&state.images_dir, &file_name, &body).await?;

    let superseded = state
        .pipeline
        .write()
        .await
        .register_image(reference.clone());

    if let Some(old) = superseded {
        release_image(&old).await;
    }

    info!(product_id = %reference.product_id, file = %reference.file_name, "Image uploaded");

    Ok(Json(reference))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads/database", post(upload_database))
        .route("/uploads/labels", post(upload_labels))
        .route("/uploads/images/:file_name", put(upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
