//! Attribute Deriver: dominant color
//!
//! Produces one color descriptor per product image. An injected
//! `VisionService` is consulted first; when it has no answer (or fails) the
//! color is computed locally from the pixels. Any failure degrades to the
//! `N/A` sentinel and never aborts the sheet.
//!
//! # Local algorithm
//! 1. Downscale so neither side exceeds [`SAMPLE_EDGE`] pixels
//! 2. Drop translucent pixels (alpha < 125) and near-white background
//!    (all channels > 250); if nothing survives, use every opaque pixel
//! 3. Quantize to 5 bits per channel and count bucket populations
//! 4. Return the mean color of the most populated bucket (lowest key on ties)

use crate::models::{ImageReference, NOT_AVAILABLE};
use crate::types::{PipelineError, VisionService};
use image::DynamicImage;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum sampled edge length after downscaling
pub const SAMPLE_EDGE: u32 = 64;

const MIN_ALPHA: u8 = 125;
const BACKGROUND_FLOOR: u8 = 250;
const QUANT_SHIFT: u8 = 3;

/// Vision service with no opinion; always defers to local computation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisionService;

#[async_trait::async_trait]
impl VisionService for NoopVisionService {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn dominant_color(
        &self,
        _image: &ImageReference,
    ) -> Result<Option<String>, PipelineError> {
        Ok(None)
    }
}

/// Format an RGB triple as a CSS color descriptor
pub fn format_rgb([r, g, b]: [u8; 3]) -> String {
    format!("rgb({}, {}, {})", r, g, b)
}

/// Dominant color of a decoded image, `None` when it has no opaque pixel
pub fn dominant_color(image: &DynamicImage) -> Option<[u8; 3]> {
    let sampled;
    let image = if image.width() > SAMPLE_EDGE || image.height() > SAMPLE_EDGE {
        sampled = image.thumbnail(SAMPLE_EDGE, SAMPLE_EDGE);
        &sampled
    } else {
        image
    };

    let rgba = image.to_rgba8();
    let opaque: Vec<[u8; 3]> = rgba
        .pixels()
        .filter(|p| p.0[3] >= MIN_ALPHA)
        .map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect();

    let foreground: Vec<[u8; 3]> = opaque
        .iter()
        .copied()
        .filter(|px| !px.iter().all(|c| *c > BACKGROUND_FLOOR))
        .collect();

    let samples = if foreground.is_empty() { &opaque } else { &foreground };
    if samples.is_empty() {
        return None;
    }

    // bucket key -> (count, channel sums)
    let mut buckets: BTreeMap<u16, (u32, [u32; 3])> = BTreeMap::new();
    for px in samples {
        let key = (u16::from(px[0] >> QUANT_SHIFT) << 10)
            | (u16::from(px[1] >> QUANT_SHIFT) << 5)
            | u16::from(px[2] >> QUANT_SHIFT);
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        for (sum, c) in entry.1.iter_mut().zip(px) {
            *sum += u32::from(*c);
        }
    }

    // Ascending key order; strict comparison keeps the lowest key on ties
    let mut best: Option<(u32, [u32; 3])> = None;
    for (count, sums) in buckets.into_values() {
        if best.map_or(true, |(c, _)| count > c) {
            best = Some((count, sums));
        }
    }

    best.map(|(count, sums)| {
        let mean = |s: u32| ((s + count / 2) / count) as u8;
        [mean(sums[0]), mean(sums[1]), mean(sums[2])]
    })
}

/// Decode image bytes and compute the dominant color
pub fn dominant_color_from_bytes(bytes: &[u8]) -> Result<Option<[u8; 3]>, PipelineError> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::Derivation(format!("decode failed: {}", e)))?;
    Ok(dominant_color(&image))
}

/// Read, decode and analyze an image file off the async runtime
pub async fn dominant_color_from_path(path: &Path) -> Result<Option<[u8; 3]>, PipelineError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| PipelineError::Derivation(format!("read {}: {}", path.display(), e)))?;

    tokio::task::spawn_blocking(move || dominant_color_from_bytes(&bytes))
        .await
        .map_err(|e| PipelineError::Derivation(format!("analysis task failed: {}", e)))?
}

/// Color derivation with vision-service preference and local fallback
#[derive(Clone)]
pub struct ColorDeriver {
    vision: Arc<dyn VisionService>,
}

impl Default for ColorDeriver {
    fn default() -> Self {
        Self::new(Arc::new(NoopVisionService))
    }
}

impl ColorDeriver {
    pub fn new(vision: Arc<dyn VisionService>) -> Self {
        Self { vision }
    }

    /// Color descriptor for a product image, or `N/A`
    ///
    /// Never fails: every error path is logged and yields the sentinel.
    pub async fn derive(&self, image: Option<&ImageReference>) -> String {
        let Some(image) = image else {
            return NOT_AVAILABLE.to_string();
        };

        match self.vision.dominant_color(image).await {
            Ok(Some(color)) if !color.trim().is_empty() => {
                debug!(product_id = %image.product_id, service = self.vision.name(), "Vision service color");
                return color.trim().to_string();
            }
            Ok(_) => {}
            Err(e) => {
                warn!(
                    product_id = %image.product_id,
                    service = self.vision.name(),
                    error = %e,
                    "Vision service failed, computing color locally"
                );
            }
        }

        match dominant_color_from_path(&image.path).await {
            Ok(Some(rgb)) => format_rgb(rgb),
            Ok(None) => {
                debug!(product_id = %image.product_id, "Image has no opaque pixels");
                NOT_AVAILABLE.to_string()
            }
            Err(e) => {
                warn!(product_id = %image.product_id, error = %e, "Color derivation failed");
                NOT_AVAILABLE.to_string()
            }
        }
    }
}
