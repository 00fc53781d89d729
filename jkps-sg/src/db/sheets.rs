//! Sheet Store
//!
//! Keyed persistence for finalized product sheets. One row per identifier;
//! `put` overwrites and no history is kept.

use crate::models::{FieldMap, ProductId, ProductSheet};
use crate::types::PipelineError;
use jkps_common::Error;
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use tracing::debug;

/// Persistent sheet collection
#[async_trait::async_trait]
pub trait SheetStore: Send + Sync {
    /// Upsert one sheet
    async fn put(&self, sheet: &ProductSheet) -> Result<(), PipelineError>;

    /// One sheet, if present
    async fn get(&self, id: &ProductId) -> Result<Option<ProductSheet>, PipelineError>;

    /// Every persisted sheet keyed by identifier
    async fn get_all(&self) -> Result<BTreeMap<ProductId, ProductSheet>, PipelineError>;
}

/// `product_sheets` table in the service database
#[derive(Clone)]
pub struct SqliteSheetStore {
    pool: SqlitePool,
}

impl SqliteSheetStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn decode_sheet(product_id: String, sheet: &str) -> Result<(ProductId, ProductSheet), PipelineError> {
    let id = ProductId::parse(&product_id).ok_or_else(|| {
        Error::Internal("Stored sheet with blank product_id".to_string())
    })?;
    let fields: FieldMap = serde_json::from_str(sheet)
        .map_err(|e| Error::Internal(format!("Corrupt stored sheet {}: {}", id, e)))?;
    Ok((id.clone(), ProductSheet::from_fields(id, fields)))
}

#[async_trait::async_trait]
impl SheetStore for SqliteSheetStore {
    async fn put(&self, sheet: &ProductSheet) -> Result<(), PipelineError> {
        // Serialize before touching the pool
        let body = serde_json::to_string(sheet.fields())
            .map_err(|e| Error::Internal(format!("Failed to serialize sheet: {}", e)))?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO product_sheets (product_id, sheet, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(product_id) DO UPDATE SET
                sheet = excluded.sheet,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(sheet.id().as_str())
        .bind(&body)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(product_id = %sheet.id(), "Persisted sheet");
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<ProductSheet>, PipelineError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT product_id, sheet FROM product_sheets WHERE product_id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;

        row.map(|(product_id, sheet)| decode_sheet(product_id, &sheet).map(|(_, s)| s))
            .transpose()
    }

    async fn get_all(&self) -> Result<BTreeMap<ProductId, ProductSheet>, PipelineError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT product_id, sheet FROM product_sheets")
                .fetch_all(&self.pool)
                .await
                .map_err(Error::Database)?;

        rows.into_iter()
            .map(|(product_id, sheet)| decode_sheet(product_id, &sheet))
            .collect()
    }
}
