pub mod types;

// Re-export commonly used types
pub use types::{fingerprint_records, short_key, SequenceRecord};
