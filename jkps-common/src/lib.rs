//! # JKPS Common Library
//!
//! Shared code for the Jakamen product sheet services:
//! - Error type shared by database and configuration layers
//! - TOML configuration and root folder resolution
//! - Database initialization

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;

pub use error::{Error, Result};
