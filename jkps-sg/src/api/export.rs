//! Export endpoint
//!
//! `GET /export/:format` with `json`, `csv` or `google-sheets`. Exports read
//! the persisted collection and are served as attachments.

use crate::services::ExportFormat;
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use tracing::info;

/// GET /export/:format
///
/// **Errors:**
/// - 400 Bad Request: unknown format, or no sheets to export
pub async fn export_sheets(
    State(state): State<AppState>,
    Path(format): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let format: ExportFormat = format.parse()?;

    let sheets = state.synthesizer.store().get_all().await?;
    let body = format.render(&sheets)?;

    info!(format = %format, sheets = sheets.len(), "Sheets exported");

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", format.file_name()),
            ),
        ],
        body,
    ))
}

/// Build export routes
pub fn export_routes() -> Router<AppState> {
    Router::new().route("/export/:format", get(export_sheets))
}
