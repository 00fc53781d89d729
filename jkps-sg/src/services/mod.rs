//! Pipeline services
//!
//! - `identifier_registry`: identifier canonicalization and image ownership
//! - `color_deriver`: dominant color per product image
//! - `description_synthesizer`: localized description text
//! - `exporter`: json / csv / headerless csv projections

pub mod color_deriver;
pub mod description_synthesizer;
pub mod exporter;
pub mod identifier_registry;

pub use color_deriver::{ColorDeriver, NoopVisionService};
pub use description_synthesizer::{
    synthesize_description, DescriptionSynthesizer, TemplateDescriptionService,
};
pub use exporter::{from_json, ExportFormat, NOTHING_TO_EXPORT_MESSAGE};
pub use identifier_registry::{
    product_id_from_image_name, release_all, release_image, write_image, ImageRegistry,
};
