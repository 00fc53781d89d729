//! Record Merger
//!
//! Combines database rows and label records, keyed by product identifier,
//! into one `MergedRecord` per database identifier.
//!
//! # Merge Strategy
//! - Database identifiers are the driving set: the output covers exactly the
//!   identifiers present in the database rows.
//! - Each record starts from the database row; a label record for the same
//!   identifier is overlaid on top (label wins on field-name collision, since
//!   it is read from the physical garment).
//! - A repeated database identifier is last-row-wins.
//! - Label and image identifiers without a database row are reported as
//!   orphans and left out.
//!
//! Image references are not copied into merged records; they are resolved per
//! identifier at sheet synthesis time.

use crate::models::{DatabaseRecord, LabelRecord, MergedRecord, ProductId};
use crate::services::identifier_registry::{orphan_ids, ImageRegistry};
use crate::types::PipelineError;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Merged records keyed by identifier
pub type Mappings = BTreeMap<ProductId, MergedRecord>;

/// Refusal message when either input set is missing
pub const MISSING_INPUTS_MESSAGE: &str = "Please upload database and labels first.";

/// Merge result with per-source counts
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub mappings: Mappings,
    /// Records carrying a label overlay
    pub with_labels: usize,
    /// Records with database fields only
    pub database_only: usize,
    /// Records whose identifier has a registered image
    pub with_images: usize,
    /// Label/image identifiers with no database row
    pub orphans: Vec<ProductId>,
}

/// Record Merger
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMerger;

impl RecordMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge database rows with label overlays
    ///
    /// Refused with a `Validation` error, before any work, when the database
    /// or the label set is empty.
    pub fn merge(
        &self,
        database: &[DatabaseRecord],
        labels: &BTreeMap<ProductId, LabelRecord>,
        images: &ImageRegistry,
    ) -> Result<MergeOutcome, PipelineError> {
        if database.is_empty() || labels.is_empty() {
            return Err(PipelineError::Validation(MISSING_INPUTS_MESSAGE.to_string()));
        }

        let mut mappings = Mappings::new();
        for row in database {
            let mut fields = row.fields().clone();
            if let Some(label) = labels.get(row.id()) {
                fields.overlay(&label.to_fields());
            }
            mappings.insert(
                row.id().clone(),
                MergedRecord {
                    id: row.id().clone(),
                    fields,
                },
            );
        }

        let with_labels = mappings.keys().filter(|id| labels.contains_key(*id)).count();
        let with_images = mappings.keys().filter(|id| images.contains(id)).count();
        let orphans = orphan_ids(database, labels, images);

        if !orphans.is_empty() {
            debug!(orphans = ?orphans, "Identifiers without database rows left unmapped");
        }

        info!(
            mapped = mappings.len(),
            with_labels,
            with_images,
            orphans = orphans.len(),
            "Auto-map complete"
        );

        Ok(MergeOutcome {
            database_only: mappings.len() - with_labels,
            with_labels,
            with_images,
            orphans,
            mappings,
        })
    }
}
