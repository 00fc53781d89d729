//! Core Types and Trait Definitions for JKPS-SG
//!
//! Defines the pipeline error kinds and the strategy traits for the two
//! optional external collaborators:
//! - **VisionService**: image analysis yielding a color descriptor
//! - **DescriptionService**: description text generation
//!
//! Both have local default implementations (see `services`), so the pipeline
//! is fully functional without any external service configured.

use crate::models::{ImageReference, Locale, MergedRecord};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Pipeline error kinds
///
/// Per-item kinds (`ExtractionMiss`, `Derivation`, `Persistence`) are isolated
/// by batch operations and reported without aborting sibling items.
/// Whole-batch kinds (`InputParse`, `Validation`) are raised before any state
/// is mutated.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Malformed tabular input; the whole import is rejected
    #[error("Input parse error: {0}")]
    InputParse(String),

    /// Label text without a resolvable product identifier
    #[error("No product identifier found in label: {0}")]
    ExtractionMiss(String),

    /// Color derivation failed (degrades to the sentinel)
    #[error("Derivation failure: {0}")]
    Derivation(String),

    /// Sheet store write or read failed
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// Operation invoked without its prerequisite data
    #[error("{0}")]
    Validation(String),

    /// Unknown product identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// External service call failed
    #[error("Service error: {0}")]
    Service(String),
}

impl From<jkps_common::Error> for PipelineError {
    fn from(err: jkps_common::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

// ============================================================================
// External collaborator strategies
// ============================================================================

/// Image analysis service
///
/// Consulted before local dominant-color computation. Returning `Ok(None)`
/// means "no opinion" and triggers the local fallback, as does an error.
#[async_trait::async_trait]
pub trait VisionService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &'static str;

    /// Representative color for the image, if the service can provide one
    async fn dominant_color(&self, image: &ImageReference)
        -> Result<Option<String>, PipelineError>;
}

/// Description generation service
///
/// An external implementation may be injected; errors or blank output fall
/// back to the local template synthesizer.
///
/// # Example
/// ```rust,ignore
/// struct Upstream;
///
/// #[async_trait::async_trait]
/// impl DescriptionService for Upstream {
///     fn name(&self) -> &'static str { "upstream" }
///
///     async fn describe(
///         &self,
///         record: &MergedRecord,
///         locale: Locale,
///         dominant_color: &str,
///     ) -> Result<String, PipelineError> {
///         call_upstream(record, locale, dominant_color).await
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait DescriptionService: Send + Sync {
    /// Service name for logging
    fn name(&self) -> &'static str;

    /// Produce the description text for one merged record
    async fn describe(
        &self,
        record: &MergedRecord,
        locale: Locale,
        dominant_color: &str,
    ) -> Result<String, PipelineError>;
}
