//! Identifier Registry
//!
//! Canonicalizes product identifiers across the three input sources and owns
//! the image reference table.
//!
//! - Database rows: `id` column (see `DatabaseRecord::from_fields`)
//! - Label texts: first `JK…` token (see `LabelExtractor`)
//! - Image files: file name segment before the first underscore
//!
//! Image files are owned by the registry. A superseded reference is handed
//! back to the caller, which must release it with [`release_image`].

use crate::models::{DatabaseRecord, ImageReference, LabelRecord, ProductId};
use crate::types::PipelineError;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Product identifier encoded in an image file name
///
/// `JK100_front.jpg` → `JK100`. Without an underscore the file stem is used
/// (`JK100.jpg` → `JK100`). Dot files such as `.png` carry no identifier.
pub fn product_id_from_image_name(file_name: &str) -> Option<ProductId> {
    let file_name = file_name.trim();
    let candidate = match file_name.split_once('_') {
        Some((prefix, _)) => prefix,
        None => Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(file_name),
    };
    if candidate.starts_with('.') {
        return None;
    }
    ProductId::parse(candidate)
}

/// Reject names that would escape the image directory
pub fn validate_image_file_name(file_name: &str) -> Result<(), PipelineError> {
    let trimmed = file_name.trim();
    if trimmed.is_empty()
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed == "."
        || trimmed == ".."
    {
        return Err(PipelineError::Validation(format!(
            "Invalid image file name: {:?}",
            file_name
        )));
    }
    Ok(())
}

/// Write uploaded image bytes into `dir` and build its reference
pub async fn write_image(
    dir: &Path,
    file_name: &str,
    bytes: &[u8],
) -> Result<ImageReference, PipelineError> {
    validate_image_file_name(file_name)?;
    let file_name = file_name.trim();
    let product_id = product_id_from_image_name(file_name).ok_or_else(|| {
        PipelineError::Validation(format!(
            "No product identifier in image file name: {}",
            file_name
        ))
    })?;

    let path = dir.join(file_name);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| PipelineError::Persistence(format!("create image dir: {}", e)))?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| PipelineError::Persistence(format!("write {}: {}", path.display(), e)))?;

    debug!(product_id = %product_id, path = %path.display(), bytes = bytes.len(), "Stored image");

    Ok(ImageReference::new(product_id, file_name, path))
}

/// Delete a released image file; failures are logged, never propagated
pub async fn release_image(reference: &ImageReference) {
    match tokio::fs::remove_file(&reference.path).await {
        Ok(()) => debug!(
            product_id = %reference.product_id,
            path = %reference.path.display(),
            "Released image"
        ),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %reference.path.display(),
            error = %e,
            "Failed to release image"
        ),
    }
}

/// Image references keyed by product identifier
#[derive(Debug, Clone, Default)]
pub struct ImageRegistry {
    images: BTreeMap<ProductId, ImageReference>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a reference; returns the superseded reference when its file differs
    pub fn register(&mut self, reference: ImageReference) -> Option<ImageReference> {
        let new_path: PathBuf = reference.path.clone();
        let previous = self.images.insert(reference.product_id.clone(), reference)?;
        if previous.path == new_path {
            None
        } else {
            Some(previous)
        }
    }

    pub fn resolve(&self, product_id: &ProductId) -> Option<&ImageReference> {
        self.images.get(product_id)
    }

    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.images.contains_key(product_id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageReference> {
        self.images.values()
    }

    /// Remove every reference, handing them back for release
    pub fn drain(&mut self) -> Vec<ImageReference> {
        std::mem::take(&mut self.images).into_values().collect()
    }
}

/// Release every registered image (service teardown)
pub async fn release_all(registry: &mut ImageRegistry) {
    let released = registry.drain();
    let count = released.len();
    for reference in &released {
        release_image(reference).await;
    }
    info!(count, "Released all images");
}

/// Label and image identifiers with no database row
///
/// These stay in intermediate state but never become sheets.
pub fn orphan_ids(
    database: &[DatabaseRecord],
    labels: &BTreeMap<ProductId, LabelRecord>,
    images: &ImageRegistry,
) -> Vec<ProductId> {
    let known: BTreeSet<&ProductId> = database.iter().map(|r| r.id()).collect();
    let orphans: BTreeSet<ProductId> = labels
        .keys()
        .chain(images.images.keys())
        .filter(|id| !known.contains(id))
        .cloned()
        .collect();
    orphans.into_iter().collect()
}
