//! Data models for product sheet generation

pub mod fields;
pub mod image_ref;
pub mod locale;
pub mod product;

pub use fields::FieldMap;
pub use image_ref::{ImageReference, IMAGES_URL_PREFIX};
pub use locale::Locale;
pub use product::{
    DatabaseRecord, LabelField, LabelRecord, MergedRecord, ProductId, ProductSheet,
    DESCRIPTION_FIELD, FULL_TEXT_FIELD, ID_FIELD, IMAGE_URL_FIELD, NOT_AVAILABLE,
};
