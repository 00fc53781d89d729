//! Fusion layer
//!
//! Reconciles independently uploaded sources into one record per product.

pub mod record_merger;

pub use record_merger::{MergeOutcome, Mappings, RecordMerger, MISSING_INPUTS_MESSAGE};
