//! Locale settings endpoint
//!
//! `GET /settings/locale` reads and `PUT /settings/locale` selects the output
//! locale for synthesized descriptions. The selection is persisted under the
//! `language` settings key and applied to the live pipeline state.

use crate::models::Locale;
use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Locale payload, used for both request and response
#[derive(Debug, Serialize, Deserialize)]
pub struct LocaleBody {
    pub locale: String,
}

/// GET /settings/locale
pub async fn get_locale(State(state): State<AppState>) -> Json<LocaleBody> {
    let locale = state.pipeline.read().await.locale();
    Json(LocaleBody {
        locale: locale.code().to_string(),
    })
}

/// PUT /settings/locale
///
/// **Request:** `{"locale": "tr"}`
///
/// **Errors:**
/// - 400 Bad Request: unsupported locale code
/// - 500 Internal Server Error: settings write failure
pub async fn set_locale(
    State(state): State<AppState>,
    Json(payload): Json<LocaleBody>,
) -> ApiResult<Json<LocaleBody>> {
    let locale: Locale = payload.locale.parse().map_err(ApiError::BadRequest)?;

    crate::db::settings::set_locale(&state.db, locale).await?;

    state.pipeline.write().await.set_locale(locale);
    info!(locale = %locale, "Output locale changed");

    Ok(Json(LocaleBody {
        locale: locale.code().to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route("/settings/locale", get(get_locale).put(set_locale))
}
