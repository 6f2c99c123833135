//! Homology search implementations

pub mod blast;
pub mod precomputed;

pub use blast::BlastSearcher;
pub use precomputed::PrecomputedHits;
