//! Product records at each pipeline stage
//!
//! `DatabaseRecord` and `LabelRecord` are raw inputs, `MergedRecord` is the
//! reconciled mapping for one identifier, and `ProductSheet` is the terminal
//! persisted entity.

use super::FieldMap;
use crate::types::PipelineError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Placeholder for any field whose source did not provide a value
pub const NOT_AVAILABLE: &str = "N/A";

/// Join key field present in every record
pub const ID_FIELD: &str = "id";
/// Sheet field holding the served image URL (empty when no image)
pub const IMAGE_URL_FIELD: &str = "imageUrl";
/// Sheet field holding the synthesized description
pub const DESCRIPTION_FIELD: &str = "description";
/// Label field holding the complete label text
pub const FULL_TEXT_FIELD: &str = "fullText";

/// Canonical product identifier, the join key across all input sources
///
/// Always non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Canonicalize a raw token; `None` when it is blank
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ProductId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One row of the uploaded product database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseRecord {
    id: ProductId,
    fields: FieldMap,
}

impl DatabaseRecord {
    /// Build from parsed row fields; `None` when the row has no usable `id`
    pub fn from_fields(fields: FieldMap) -> Option<Self> {
        let id = ProductId::parse(fields.get(ID_FIELD)?)?;
        let mut fields = fields;
        // Store the canonical form so merged records and sheets agree with the key
        fields.insert(ID_FIELD, id.as_str());
        Some(Self { id, fields })
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }
}

/// Structured label fields, in the order they are merged into records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelField {
    Color,
    Size,
    Drop,
    Kalip,
    Composition,
    Care,
    Barcode,
}

impl LabelField {
    pub const ALL: [LabelField; 7] = [
        LabelField::Color,
        LabelField::Size,
        LabelField::Drop,
        LabelField::Kalip,
        LabelField::Composition,
        LabelField::Care,
        LabelField::Barcode,
    ];

    /// Record field name
    pub fn key(self) -> &'static str {
        match self {
            LabelField::Color => "color",
            LabelField::Size => "size",
            LabelField::Drop => "drop",
            LabelField::Kalip => "kalip",
            LabelField::Composition => "composition",
            LabelField::Care => "care",
            LabelField::Barcode => "barcode",
        }
    }
}

/// Fields extracted from one garment label text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
    pub drop: String,
    pub kalip: String,
    pub composition: String,
    pub care: String,
    pub barcode: String,
    pub full_text: String,
}

impl LabelRecord {
    /// Record with every structured field set to the sentinel
    pub fn new(product_id: ProductId, full_text: impl Into<String>) -> Self {
        Self {
            product_id,
            color: NOT_AVAILABLE.to_string(),
            size: NOT_AVAILABLE.to_string(),
            drop: NOT_AVAILABLE.to_string(),
            kalip: NOT_AVAILABLE.to_string(),
            composition: NOT_AVAILABLE.to_string(),
            care: NOT_AVAILABLE.to_string(),
            barcode: NOT_AVAILABLE.to_string(),
            full_text: full_text.into(),
        }
    }

    fn slot_mut(&mut self, field: LabelField) -> &mut String {
        match field {
            LabelField::Color => &mut self.color,
            LabelField::Size => &mut self.size,
            LabelField::Drop => &mut self.drop,
            LabelField::Kalip => &mut self.kalip,
            LabelField::Composition => &mut self.composition,
            LabelField::Care => &mut self.care,
            LabelField::Barcode => &mut self.barcode,
        }
    }

    pub fn get(&self, field: LabelField) -> &str {
        match field {
            LabelField::Color => &self.color,
            LabelField::Size => &self.size,
            LabelField::Drop => &self.drop,
            LabelField::Kalip => &self.kalip,
            LabelField::Composition => &self.composition,
            LabelField::Care => &self.care,
            LabelField::Barcode => &self.barcode,
        }
    }

    pub fn set(&mut self, field: LabelField, value: impl Into<String>) {
        *self.slot_mut(field) = value.into();
    }

    /// Field view used when overlaying onto a database row
    pub fn to_fields(&self) -> FieldMap {
        let mut fields: FieldMap = LabelField::ALL
            .iter()
            .map(|f| (f.key(), self.get(*f)))
            .collect();
        fields.insert(FULL_TEXT_FIELD, self.full_text.as_str());
        fields
    }
}

/// Database row with its label overlay, keyed by identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRecord {
    pub id: ProductId,
    pub fields: FieldMap,
}

impl MergedRecord {
    /// Field value or the sentinel when absent
    pub fn field_or_sentinel(&self, key: &str) -> &str {
        self.fields.get(key).unwrap_or(NOT_AVAILABLE)
    }
}

/// Persisted product sheet: merged fields plus `imageUrl` and `description`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSheet {
    id: ProductId,
    fields: FieldMap,
}

impl ProductSheet {
    /// Assemble a sheet from a merged record
    ///
    /// An existing `description` field is overwritten in place.
    pub fn assemble(record: &MergedRecord, image_url: &str, description: String) -> Self {
        let mut fields = record.fields.clone();
        fields.insert(IMAGE_URL_FIELD, image_url);
        fields.insert(DESCRIPTION_FIELD, description);
        Self {
            id: record.id.clone(),
            fields,
        }
    }

    /// Rebuild a sheet read back from storage or an export
    pub fn from_fields(id: ProductId, fields: FieldMap) -> Self {
        Self { id, fields }
    }

    /// Copy of this sheet with only the image URL and description replaced
    pub fn regenerated(&self, image_url: &str, description: String) -> Self {
        let mut fields = self.fields.clone();
        fields.insert(IMAGE_URL_FIELD, image_url);
        fields.insert(DESCRIPTION_FIELD, description);
        Self {
            id: self.id.clone(),
            fields,
        }
    }

    pub fn id(&self) -> &ProductId {
        &self.id
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub fn image_url(&self) -> &str {
        self.fields.get(IMAGE_URL_FIELD).unwrap_or_default()
    }

    pub fn description(&self) -> &str {
        self.fields.get(DESCRIPTION_FIELD).unwrap_or_default()
    }

    /// Direct field edit; the identifier field is immutable
    pub fn set_field(&mut self, field: &str, value: impl Into<String>) -> Result<(), PipelineError> {
        reject_id_edit(field)?;
        self.fields.insert(field, value);
        Ok(())
    }
}

/// Guard shared by mapping and sheet edits
pub(crate) fn reject_id_edit(field: &str) -> Result<(), PipelineError> {
    if field.trim().is_empty() {
        return Err(PipelineError::Validation("Field name must not be empty".to_string()));
    }
    if field == ID_FIELD {
        return Err(PipelineError::Validation(
            "The id field cannot be edited".to_string(),
        ));
    }
    Ok(())
}
