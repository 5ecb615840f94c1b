pub mod agents;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod contacts;
pub mod customer_success;
pub mod dashboard;
pub mod error;
pub mod insights;
pub mod lifecycle;
pub mod model;
pub mod seed;
pub mod sprint;
pub mod storage;
pub mod test_utils;

pub use error::{Result, SbError};

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
