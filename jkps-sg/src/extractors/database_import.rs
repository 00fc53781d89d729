//! Product database import
//!
//! Parses delimited text with a header row into `DatabaseRecord`s. The import
//! is all-or-nothing: any parse error rejects the whole file and no partial
//! result escapes.

use crate::models::{DatabaseRecord, FieldMap, ID_FIELD};
use crate::types::PipelineError;
use std::io::Read;
use tracing::{info, warn};

/// Delimited-text import options
#[derive(Debug, Clone, Copy)]
pub struct DatabaseImportOptions {
    pub delimiter: u8,
}

impl Default for DatabaseImportOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// Parse a product database from CSV text
///
/// Header names are trimmed and must include `id`. Short rows simply lack the
/// trailing fields; extra cells beyond the header are ignored. Rows whose `id`
/// is blank are skipped with a warning.
pub fn import_database<R: Read>(
    reader: R,
    options: DatabaseImportOptions,
) -> Result<Vec<DatabaseRecord>, PipelineError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .map_err(map_csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::InputParse("database file is empty".to_string()));
    }
    if !headers.iter().any(|h| h == ID_FIELD) {
        return Err(PipelineError::InputParse(format!(
            "database file has no `{}` column",
            ID_FIELD
        )));
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (index, row) in csv_reader.records().enumerate() {
        let row = row.map_err(map_csv_error)?;

        let fields: FieldMap = headers
            .iter()
            .zip(row.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        match DatabaseRecord::from_fields(fields) {
            Some(record) => records.push(record),
            None => {
                // Data row numbers are 1-based after the header line
                warn!(row = index + 2, "Skipping database row without id");
                skipped += 1;
            }
        }
    }

    info!(records = records.len(), skipped, "Parsed product database");

    Ok(records)
}

fn map_csv_error(err: csv::Error) -> PipelineError {
    match err.position() {
        Some(pos) => PipelineError::InputParse(format!(
            "line {}: {}",
            pos.line(),
            err
        )),
        None => PipelineError::InputParse(err.to_string()),
    }
}
