//! Sequence containers and reference tables for ampscan

pub mod formats;
pub mod reference;
pub mod sequence;

// Re-export commonly used types
pub use formats::fasta::{parse_fasta_bytes, read_fasta, serialize_fasta, write_fasta};
pub use reference::{ReferenceMetadata, ReferenceTable};
pub use sequence::{fingerprint_records, short_key, SequenceRecord};
