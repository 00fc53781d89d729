//! Database initialization shared by JKPS services

pub mod init;

pub use init::{create_tables, init_database};
