/// Core types shared across all ampscan crates
pub mod format;
pub mod hash;
pub mod hit;
pub mod prediction;

pub use format::OutputFormat;
pub use hash::{Fingerprint, Fingerprinter};
pub use hit::HomologyHit;
pub use prediction::PredictionRecord;
