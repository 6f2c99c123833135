pub mod fasta;

// Re-export commonly used functions
pub use fasta::{parse_fasta_bytes, read_fasta, serialize_fasta, write_fasta};
