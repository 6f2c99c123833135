//! Core utilities and types shared across all ampscan crates

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use error::{AmpscanError, AmpscanResult};

pub use types::{Fingerprint, HomologyHit, OutputFormat, PredictionRecord};

/// Version information for the ampscan project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
