//! Sheet Synthesis Orchestrator
//!
//! Turns merged records into persisted product sheets.
//!
//! # Per-identifier steps
//! 1. Resolve the image reference
//! 2. Derive the dominant color (completes before step 3 starts)
//! 3. Synthesize the description
//! 4. Assemble the sheet: merged fields, then `imageUrl`, then `description`
//! 5. Persist through the `SheetStore`
//!
//! # Error Handling
//! - Per-identifier isolation: a persistence failure is recorded in the
//!   report and the loop continues
//! - Derivation and description failures never surface; they degrade to the
//!   sentinel and the template respectively
//! - The returned sheet batch always contains every identifier, whatever the
//!   persistence outcome
//!
//! # Example
//! ```rust,ignore
//! let input = state.read().await.generation_input()?;
//! let report = synthesizer.generate(input).await;
//! state.write().await.replace_sheets(report.sheets.clone());
//! ```

use super::state::{GenerationInput, RegenerationInput};
use crate::db::SheetStore;
use crate::models::{ImageReference, Locale, MergedRecord, ProductId, ProductSheet};
use crate::services::{ColorDeriver, DescriptionSynthesizer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One identifier whose sheet could not be persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetFailure {
    pub product_id: ProductId,
    pub message: String,
}

/// Result of one generation run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub run_id: Uuid,
    /// Every generated sheet, persisted or not
    pub sheets: BTreeMap<ProductId, ProductSheet>,
    pub failures: Vec<SheetFailure>,
}

/// Result of regenerating one sheet
#[derive(Debug, Clone)]
pub struct RegenerationOutcome {
    pub sheet: ProductSheet,
    /// Set when the store write failed; the sheet is still valid in memory
    pub persist_error: Option<String>,
}

/// Sheet synthesis pipeline
#[derive(Clone)]
pub struct SheetSynthesizer {
    deriver: ColorDeriver,
    describer: DescriptionSynthesizer,
    store: Arc<dyn SheetStore>,
}

impl SheetSynthesizer {
    pub fn new(
        deriver: ColorDeriver,
        describer: DescriptionSynthesizer,
        store: Arc<dyn SheetStore>,
    ) -> Self {
        Self {
            deriver,
            describer,
            store,
        }
    }

    /// Synthesizer with local derivation and template descriptions
    pub fn with_store(store: Arc<dyn SheetStore>) -> Self {
        Self::new(ColorDeriver::default(), DescriptionSynthesizer::default(), store)
    }

    pub fn store(&self) -> &Arc<dyn SheetStore> {
        &self.store
    }

    /// Image URL and description for one record
    pub async fn synthesize(
        &self,
        record: &MergedRecord,
        image: Option<&ImageReference>,
        locale: Locale,
    ) -> (String, String) {
        let color = self.deriver.derive(image).await;
        let description = self.describer.describe(record, locale, &color).await;
        let image_url = image.map(|i| i.url.clone()).unwrap_or_default();
        (image_url, description)
    }

    /// Generate and persist a sheet for every mapped identifier
    pub async fn generate(&self, input: GenerationInput) -> GenerationReport {
        let run_id = Uuid::new_v4();
        info!(
            run_id = %run_id,
            records = input.mappings.len(),
            locale = %input.locale,
            "Sheet generation started"
        );

        let mut sheets = BTreeMap::new();
        let mut failures = Vec::new();

        for (id, record) in &input.mappings {
            let image = input.images.resolve(id);
            let (image_url, description) = self.synthesize(record, image, input.locale).await;
            let sheet = ProductSheet::assemble(record, &image_url, description);

            match self.store.put(&sheet).await {
                Ok(()) => debug!(run_id = %run_id, product_id = %id, "Sheet generated"),
                Err(e) => {
                    warn!(run_id = %run_id, product_id = %id, error = %e, "Sheet not persisted");
                    failures.push(SheetFailure {
                        product_id: id.clone(),
                        message: e.to_string(),
                    });
                }
            }

            sheets.insert(id.clone(), sheet);
        }

        info!(
            run_id = %run_id,
            sheets = sheets.len(),
            failures = failures.len(),
            "Sheet generation complete"
        );

        GenerationReport {
            run_id,
            sheets,
            failures,
        }
    }

    /// Regenerate one sheet, keeping the fields of any existing sheet
    pub async fn regenerate(&self, input: RegenerationInput) -> RegenerationOutcome {
        let RegenerationInput {
            locale,
            record,
            image,
            existing,
        } = input;

        let (image_url, description) = self.synthesize(&record, image.as_ref(), locale).await;
        let sheet = match existing {
            Some(existing) => existing.regenerated(&image_url, description),
            None => ProductSheet::assemble(&record, &image_url, description),
        };

        let persist_error = match self.store.put(&sheet).await {
            Ok(()) => None,
            Err(e) => {
                warn!(product_id = %sheet.id(), error = %e, "Regenerated sheet not persisted");
                Some(e.to_string())
            }
        };

        info!(product_id = %sheet.id(), persisted = persist_error.is_none(), "Sheet regenerated");

        RegenerationOutcome {
            sheet,
            persist_error,
        }
    }
}
