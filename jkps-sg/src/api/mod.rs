//! HTTP API handlers for jkps-sg

pub mod export;
pub mod health;
pub mod mappings;
pub mod settings;
pub mod sheets;
pub mod uploads;

pub use export::export_routes;
pub use health::health_routes;
pub use mappings::mapping_routes;
pub use settings::settings_routes;
pub use sheets::sheet_routes;
pub use uploads::upload_routes;

use crate::models::ProductId;
use crate::ApiError;
use serde::Deserialize;

/// `{"field", "value"}` edit payload for mappings and sheets
#[derive(Debug, Deserialize)]
pub struct FieldEdit {
    pub field: String,
    pub value: String,
}

pub(crate) fn parse_product_id(raw: &str) -> Result<ProductId, ApiError> {
    ProductId::parse(raw).ok_or_else(|| ApiError::BadRequest("Empty product identifier".to_string()))
}
