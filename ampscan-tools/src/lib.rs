//! Adapters for the external tools ampscan drives
//!
//! The classifier adapter batches sequences through an opaque scoring
//! function and caches the results by content fingerprint. The homology
//! adapter runs an external search against an indexed reference set and
//! parses its tabular output into typed hits.

// Modules
pub mod aligners;
pub mod classifier;
mod process;
pub mod testing;
pub mod traits;

// Re-exports for convenience
pub use aligners::{BlastSearcher, PrecomputedHits};
pub use classifier::{ClassifierAdapter, CommandScorer, ScoreCache};
pub use testing::{MockScorer, MockSearcher};
pub use traits::{HomologySearch, Scorer};
