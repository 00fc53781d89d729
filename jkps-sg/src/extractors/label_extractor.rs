//! Label Extractor
//!
//! Parses one free-text garment label into a `LabelRecord`.
//!
//! # Rules
//! The product identifier is the first `JK<word>` token in the text. Every
//! other field has its own named labeled-line rule, applied independently to
//! the full text:
//!
//! | field       | label                              | value                      |
//! |-------------|------------------------------------|----------------------------|
//! | color       | `Renk/Color:`, else `Color:`       | word chars and blanks      |
//! | size        | `Beden/Size:`, else `Size:`        | word chars, blanks and `/` |
//! | drop        | `Drop:`                            | word chars and blanks      |
//! | kalip       | `Kalip:` / `Kalıp:`                | word chars and blanks      |
//! | composition | `Material Composition:`            | word chars, blanks and `%` |
//! | care        | `Care Instructions:`               | rest of the line           |
//! | barcode     | `Barcode:`                         | digits                     |
//!
//! Labels are printed with inconsistent layouts, so a missing or reordered
//! field never fails the record: the field keeps the `N/A` sentinel. Captures
//! never cross a line break, and the first match per field wins. A bare
//! `Color:` / `Size:` label only counts at the start of a line, and only when
//! the bilingual label is absent.

use crate::models::{LabelField, LabelRecord, ProductId};
use crate::types::PipelineError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"JK\w+").expect("valid product id pattern"));

struct FieldRule {
    field: LabelField,
    /// Tried in order; the first pattern with a non-blank capture wins
    patterns: Vec<Regex>,
}

impl FieldRule {
    fn new(field: LabelField, pattern: &str) -> Self {
        Self::with_fallbacks(field, &[pattern])
    }

    fn with_fallbacks(field: LabelField, patterns: &[&str]) -> Self {
        Self {
            field,
            patterns: patterns
                .iter()
                .map(|p| Regex::new(p).expect("valid label field pattern"))
                .collect(),
        }
    }

    /// Trimmed first capture; blank captures count as a miss
    fn apply(&self, text: &str) -> Option<String> {
        self.patterns.iter().find_map(|pattern| {
            let captured = pattern.captures(text)?.get(1)?.as_str().trim();
            if captured.is_empty() {
                None
            } else {
                Some(captured.to_string())
            }
        })
    }
}

static FIELD_RULES: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        FieldRule::with_fallbacks(
            LabelField::Color,
            &[
                r"Renk/Color:[ \t]*([\w \t]+)",
                r"(?m)^[ \t]*Color:[ \t]*([\w \t]+)",
            ],
        ),
        FieldRule::with_fallbacks(
            LabelField::Size,
            &[
                r"Beden/Size:[ \t]*([\w \t/]+)",
                r"(?m)^[ \t]*Size:[ \t]*([\w \t/]+)",
            ],
        ),
        FieldRule::new(LabelField::Drop, r"Drop:[ \t]*([\w \t]+)"),
        FieldRule::new(LabelField::Kalip, r"Kal[iı]p:[ \t]*([\w \t]+)"),
        FieldRule::new(LabelField::Composition, r"Material Composition:[ \t]*([\w \t%]+)"),
        FieldRule::new(LabelField::Care, r"Care Instructions:[ \t]*([^\r\n]+)"),
        FieldRule::new(LabelField::Barcode, r"Barcode:[ \t]*(\d+)"),
    ]
});

/// One uploaded label file
#[derive(Debug, Clone)]
pub struct LabelSource {
    /// File name, used for diagnostics only
    pub name: String,
    pub content: String,
}

/// Result of extracting a batch of label files
#[derive(Debug, Clone, Default)]
pub struct LabelBatch {
    /// Extracted records in input order
    pub records: Vec<LabelRecord>,
    /// Names of files that yielded no product identifier
    pub misses: Vec<String>,
}

/// Label text extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelExtractor;

impl LabelExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First `JK…` token in the text
    pub fn extract_identifier(&self, text: &str) -> Option<ProductId> {
        PRODUCT_ID
            .find(text)
            .and_then(|m| ProductId::parse(m.as_str()))
    }

    /// Extract a record, or an `ExtractionMiss` naming `source_name`
    pub fn try_extract(&self, source_name: &str, text: &str) -> Result<LabelRecord, PipelineError> {
        let product_id = self
            .extract_identifier(text)
            .ok_or_else(|| PipelineError::ExtractionMiss(source_name.to_string()))?;

        let mut record = LabelRecord::new(product_id, text);
        for rule in FIELD_RULES.iter() {
            if let Some(value) = rule.apply(text) {
                record.set(rule.field, value);
            }
        }

        debug!(
            product_id = %record.product_id,
            color = %record.color,
            size = %record.size,
            "Extracted label"
        );

        Ok(record)
    }

    /// Extract a record; a missing identifier is logged and yields `None`
    pub fn extract(&self, text: &str) -> Option<LabelRecord> {
        match self.try_extract("<inline>", text) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "Could not extract product ID from label");
                None
            }
        }
    }

    /// Extract every file independently; misses never abort the batch
    pub fn extract_batch<I>(&self, sources: I) -> LabelBatch
    where
        I: IntoIterator<Item = LabelSource>,
    {
        let mut batch = LabelBatch::default();
        for source in sources {
            match self.try_extract(&source.name, &source.content) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    warn!(file = %source.name, error = %e, "Skipping label without product ID");
                    batch.misses.push(source.name);
                }
            }
        }
        batch
    }
}
