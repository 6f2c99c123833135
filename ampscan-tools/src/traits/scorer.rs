/// Trait for probabilistic sequence classifiers
use ampscan_bio::SequenceRecord;
use ampscan_core::AmpscanResult;

/// Opaque scoring function assigning each sequence a probability in [0, 1].
///
/// Implementations must be deterministic for a given `identity()`: cached
/// scores are reused whenever the identity and the input set match.
pub trait Scorer: Send + Sync {
    /// Stable description of the model, part of the cache key
    fn identity(&self) -> String;

    /// Check if the scorer can be invoked
    fn is_available(&self) -> bool;

    /// Score a batch, returning one probability per input in input order
    fn score_batch(&self, batch: &[SequenceRecord]) -> AmpscanResult<Vec<f64>>;

    /// Get recommended batch size
    fn recommended_batch_size(&self) -> usize {
        1000
    }
}

impl<T: Scorer + ?Sized> Scorer for Box<T> {
    fn identity(&self) -> String {
        (**self).identity()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    fn score_batch(&self, batch: &[SequenceRecord]) -> AmpscanResult<Vec<f64>> {
        (**self).score_batch(batch)
    }

    fn recommended_batch_size(&self) -> usize {
        (**self).recommended_batch_size()
    }
}
