//! Exporter
//!
//! Read-only projections of the sheet collection into interchange formats.

use crate::models::{FieldMap, ProductId, ProductSheet};
use crate::types::PipelineError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Refusal message for an empty collection
pub const NOTHING_TO_EXPORT_MESSAGE: &str = "No product sheets to export.";

/// Export target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    /// Value-only rows for pasting into a spreadsheet
    GoogleSheets,
}

impl ExportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ExportFormat::Json => "product_sheets.json",
            ExportFormat::Csv | ExportFormat::GoogleSheets => "product_sheets.csv",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv | ExportFormat::GoogleSheets => "text/csv; charset=utf-8",
        }
    }

    /// Render the full collection; empty collections are refused
    pub fn render(self, sheets: &BTreeMap<ProductId, ProductSheet>) -> Result<String, PipelineError> {
        if sheets.is_empty() {
            return Err(PipelineError::Validation(NOTHING_TO_EXPORT_MESSAGE.to_string()));
        }
        match self {
            ExportFormat::Json => to_json(sheets),
            ExportFormat::Csv => to_csv(sheets),
            ExportFormat::GoogleSheets => to_headerless_csv(sheets),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::GoogleSheets => "google-sheets",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "google-sheets" | "googlesheets" => Ok(ExportFormat::GoogleSheets),
            other => Err(PipelineError::Validation(format!(
                "Unsupported export format: {}",
                other
            ))),
        }
    }
}

/// Pretty JSON object keyed by identifier
pub fn to_json(sheets: &BTreeMap<ProductId, ProductSheet>) -> Result<String, PipelineError> {
    let view: BTreeMap<&ProductId, &FieldMap> =
        sheets.iter().map(|(id, sheet)| (id, sheet.fields())).collect();
    serde_json::to_string_pretty(&view)
        .map_err(|e| PipelineError::Service(format!("JSON encode failed: {}", e)))
}

/// Rebuild a collection from [`to_json`] output
pub fn from_json(text: &str) -> Result<BTreeMap<ProductId, ProductSheet>, PipelineError> {
    let raw: BTreeMap<String, FieldMap> = serde_json::from_str(text)
        .map_err(|e| PipelineError::InputParse(format!("invalid sheet JSON: {}", e)))?;

    raw.into_iter()
        .map(|(key, fields)| {
            let id = ProductId::parse(&key)
                .ok_or_else(|| PipelineError::InputParse("blank product identifier".to_string()))?;
            Ok((id.clone(), ProductSheet::from_fields(id, fields)))
        })
        .collect()
}

/// CSV with a header of every field name in first-seen order
pub fn to_csv(sheets: &BTreeMap<ProductId, ProductSheet>) -> Result<String, PipelineError> {
    let mut header: Vec<&str> = Vec::new();
    for sheet in sheets.values() {
        for key in sheet.fields().keys() {
            if !header.contains(&key) {
                header.push(key);
            }
        }
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&header).map_err(map_csv_error)?;
    for sheet in sheets.values() {
        let row = header.iter().map(|key| sheet.fields().get(key).unwrap_or(""));
        writer.write_record(row).map_err(map_csv_error)?;
    }
    finish(writer)
}

/// Value-only rows, each in its sheet's own key order
pub fn to_headerless_csv(sheets: &BTreeMap<ProductId, ProductSheet>) -> Result<String, PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    for sheet in sheets.values() {
        writer
            .write_record(sheet.fields().values())
            .map_err(map_csv_error)?;
    }
    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, PipelineError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| PipelineError::Service(format!("CSV flush failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| PipelineError::Service(format!("CSV encode failed: {}", e)))
}

fn map_csv_error(err: csv::Error) -> PipelineError {
    PipelineError::Service(format!("CSV encode failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(pairs: &[(&str, &str)]) -> (ProductId, ProductSheet) {
        let fields: FieldMap = pairs.iter().copied().collect();
        let id = ProductId::parse(fields.get("id").unwrap()).unwrap();
        (id.clone(), ProductSheet::from_fields(id, fields))
    }

    fn collection() -> BTreeMap<ProductId, ProductSheet> {
        [
            sheet(&[("id", "JK1"), ("name", "Shirt"), ("imageUrl", ""), ("description", "a\nb")]),
            sheet(&[("id", "JK2"), ("color", "Red"), ("name", "Coat, long")]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_format_names() {
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "google-sheets".parse::<ExportFormat>().unwrap(),
            ExportFormat::GoogleSheets
        );
        assert!("xlsx".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Json.file_name(), "product_sheets.json");
        assert_eq!(ExportFormat::GoogleSheets.file_name(), "product_sheets.csv");
    }

    #[test]
    fn test_json_round_trip() {
        let sheets = collection();
        let text = to_json(&sheets).unwrap();
        let restored = from_json(&text).unwrap();

        assert_eq!(restored, sheets);
        assert_eq!(
            restored[&ProductId::parse("JK1").unwrap()].fields().keys().collect::<Vec<_>>(),
            vec!["id", "name", "imageUrl", "description"]
        );
    }

    #[test]
    fn test_json_is_keyed_by_identifier() {
        let value: serde_json::Value = serde_json::from_str(&to_json(&collection()).unwrap()).unwrap();
        assert_eq!(value["JK2"]["color"], "Red");
    }

    #[test]
    fn test_csv_header_is_union_in_first_seen_order() {
        let text = to_csv(&collection()).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next(), Some("id,name,imageUrl,description,color"));

        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "a\nb");
        assert_eq!(&rows[0][4], "");
        assert_eq!(&rows[1][1], "Coat, long");
        assert_eq!(&rows[1][2], "");
    }

    #[test]
    fn test_headerless_rows_follow_sheet_key_order() {
        let text = to_headerless_csv(&collection()).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();

        assert_eq!(rows[0], vec!["JK1", "Shirt", "", "a\nb"]);
        assert_eq!(rows[1], vec!["JK2", "Red", "Coat, long"]);
    }

    #[test]
    fn test_empty_collection_is_refused() {
        for format in [ExportFormat::Json, ExportFormat::Csv, ExportFormat::GoogleSheets] {
            let err = format.render(&BTreeMap::new()).unwrap_err();
            assert_eq!(err.to_string(), NOTHING_TO_EXPORT_MESSAGE);
        }
    }
}
