//! Session workflow: pipeline state and sheet synthesis

pub mod pipeline;
pub mod state;

pub use pipeline::{GenerationReport, RegenerationOutcome, SheetFailure, SheetSynthesizer};
pub use state::{GenerationInput, PipelineState, RegenerationInput, MISSING_MAPPINGS_MESSAGE};
