pub mod annotate;
pub mod config;
