//! Raw input extractors
//!
//! Turn uploaded inputs into typed records:
//! - `database_import`: tabular product database → `DatabaseRecord`s
//! - `label_extractor`: free-text garment labels → `LabelRecord`s

pub mod database_import;
pub mod label_extractor;

pub use database_import::{import_database, DatabaseImportOptions};
pub use label_extractor::{LabelBatch, LabelExtractor, LabelSource};
