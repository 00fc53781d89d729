//! Pipeline State
//!
//! One explicit struct owns every stage of a session:
//! raw inputs (database rows, label records, image references) →
//! merged records → product sheets.
//!
//! All mutation goes through the transition methods below. Whole-batch
//! preconditions are checked before anything is touched, so a refused
//! transition leaves the state unchanged.

use crate::fusion::{Mappings, MergeOutcome, RecordMerger};
use crate::models::{
    product::reject_id_edit, DatabaseRecord, ImageReference, LabelRecord, Locale, MergedRecord,
    ProductId, ProductSheet,
};
use crate::services::ImageRegistry;
use crate::types::PipelineError;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Refusal message for generate without mappings
pub const MISSING_MAPPINGS_MESSAGE: &str = "Please map the data first.";

/// Session state for the sheet pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    locale: Locale,
    /// `None` until a database has been uploaded
    database: Option<Vec<DatabaseRecord>>,
    labels: BTreeMap<ProductId, LabelRecord>,
    images: ImageRegistry,
    mappings: Mappings,
    sheets: BTreeMap<ProductId, ProductSheet>,
}

/// Owned snapshot taken before a generation run
///
/// Handlers release the state lock while the run awaits derivation and
/// persistence, then write the results back.
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub locale: Locale,
    pub mappings: Mappings,
    pub images: ImageRegistry,
}

/// Owned snapshot for regenerating one sheet
#[derive(Debug, Clone)]
pub struct RegenerationInput {
    pub locale: Locale,
    pub record: MergedRecord,
    pub image: Option<ImageReference>,
    pub existing: Option<ProductSheet>,
}

impl PipelineState {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn database(&self) -> Option<&[DatabaseRecord]> {
        self.database.as_deref()
    }

    pub fn labels(&self) -> &BTreeMap<ProductId, LabelRecord> {
        &self.labels
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn mappings(&self) -> &Mappings {
        &self.mappings
    }

    pub fn sheets(&self) -> &BTreeMap<ProductId, ProductSheet> {
        &self.sheets
    }

    pub fn sheet(&self, id: &ProductId) -> Option<&ProductSheet> {
        self.sheets.get(id)
    }

    // ------------------------------------------------------------------
    // Input transitions
    // ------------------------------------------------------------------

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Replace the database with a freshly imported one
    pub fn replace_database(&mut self, records: Vec<DatabaseRecord>) {
        info!(records = records.len(), "Database replaced");
        self.database = Some(records);
    }

    /// Add label records; a later label for the same identifier wins
    pub fn add_labels(&mut self, records: impl IntoIterator<Item = LabelRecord>) -> usize {
        let mut added = 0;
        for record in records {
            self.labels.insert(record.product_id.clone(), record);
            added += 1;
        }
        debug!(added, total = self.labels.len(), "Labels updated");
        added
    }

    /// Register an image; returns the superseded reference for release
    pub fn register_image(&mut self, reference: ImageReference) -> Option<ImageReference> {
        self.images.register(reference)
    }

    /// Take every image reference out of the state for teardown
    pub fn take_images(&mut self) -> ImageRegistry {
        std::mem::take(&mut self.images)
    }

    // ------------------------------------------------------------------
    // Mapping transitions
    // ------------------------------------------------------------------

    /// Run the Record Merger and replace the mapping table
    pub fn auto_map(&mut self) -> Result<MergeOutcome, PipelineError> {
        let database = self.database.as_deref().unwrap_or_default();
        let outcome = RecordMerger::new().merge(database, &self.labels, &self.images)?;
        self.mappings = outcome.mappings.clone();
        Ok(outcome)
    }

    /// Edit one merged field; the identifier is immutable
    pub fn edit_mapping(
        &mut self,
        id: &ProductId,
        field: &str,
        value: String,
    ) -> Result<&MergedRecord, PipelineError> {
        reject_id_edit(field)?;
        let record = self
            .mappings
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotFound(format!("No mapping for {}", id)))?;
        record.fields.insert(field, value);
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Sheet transitions
    // ------------------------------------------------------------------

    /// Snapshot for a generation run; refused when nothing is mapped
    pub fn generation_input(&self) -> Result<GenerationInput, PipelineError> {
        if self.mappings.is_empty() {
            return Err(PipelineError::Validation(MISSING_MAPPINGS_MESSAGE.to_string()));
        }
        Ok(GenerationInput {
            locale: self.locale,
            mappings: self.mappings.clone(),
            images: self.images.clone(),
        })
    }

    /// Snapshot for regenerating one sheet; unknown mappings are NotFound
    pub fn regeneration_input(&self, id: &ProductId) -> Result<RegenerationInput, PipelineError> {
        let record = self
            .mappings
            .get(id)
            .cloned()
            .ok_or_else(|| PipelineError::NotFound(format!("No mapping for {}", id)))?;
        Ok(RegenerationInput {
            locale: self.locale,
            record,
            image: self.images.resolve(id).cloned(),
            existing: self.sheets.get(id).cloned(),
        })
    }

    /// Replace the sheet collection (generate, load)
    pub fn replace_sheets(&mut self, sheets: BTreeMap<ProductId, ProductSheet>) {
        self.sheets = sheets;
    }

    /// Upsert one sheet (regenerate)
    pub fn put_sheet(&mut self, sheet: ProductSheet) {
        self.sheets.insert(sheet.id().clone(), sheet);
    }

    /// Direct field edit on an existing sheet; returns the updated copy
    pub fn edit_sheet(
        &mut self,
        id: &ProductId,
        field: &str,
        value: String,
    ) -> Result<ProductSheet, PipelineError> {
        let sheet = self
            .sheets
            .get_mut(id)
            .ok_or_else(|| PipelineError::NotFound(format!("No sheet for {}", id)))?;
        sheet.set_field(field, value)?;
        Ok(sheet.clone())
    }
}
