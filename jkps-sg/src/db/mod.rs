//! Database access for jkps-sg
//!
//! Tables are created by `jkps_common::db::init_database`.

pub mod settings;
pub mod sheets;

pub use sheets::{SheetStore, SqliteSheetStore};
