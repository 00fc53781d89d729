//! Uploaded product image handle

use super::ProductId;
use serde::Serialize;
use std::path::PathBuf;

/// URL prefix under which uploaded images are served
pub const IMAGES_URL_PREFIX: &str = "/images";

/// A stored image file associated with one product identifier
///
/// The file under `path` is owned by the `ImageRegistry` and deleted when the
/// reference is superseded or the registry is torn down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
    pub product_id: ProductId,
    pub file_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub url: String,
}

impl ImageReference {
    pub fn new(product_id: ProductId, file_name: impl Into<String>, path: PathBuf) -> Self {
        let file_name = file_name.into();
        let url = format!("{}/{}", IMAGES_URL_PREFIX, file_name);
        Self {
            product_id,
            file_name,
            path,
            url,
        }
    }
}
