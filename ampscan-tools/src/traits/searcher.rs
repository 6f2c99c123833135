/// Traits for homology search tools
use ampscan_bio::SequenceRecord;
use ampscan_core::{AmpscanResult, HomologyHit};

/// Trait for homology search tools
///
/// A query may yield zero, one or many hits in any order. Implementations
/// neither deduplicate nor rank; a malformed result aborts the whole call.
pub trait HomologySearch: Send + Sync {
    /// Search every query against the reference database
    fn search(
        &mut self,
        queries: &[SequenceRecord],
        database: &[SequenceRecord],
    ) -> AmpscanResult<Vec<HomologyHit>>;

    /// Get tool version
    fn version(&self) -> AmpscanResult<String>;

    /// Check if tool is available
    fn is_available(&self) -> bool;
}

impl<T: HomologySearch + ?Sized> HomologySearch for Box<T> {
    fn search(
        &mut self,
        queries: &[SequenceRecord],
        database: &[SequenceRecord],
    ) -> AmpscanResult<Vec<HomologyHit>> {
        (**self).search(queries, database)
    }

    fn version(&self) -> AmpscanResult<String> {
        (**self).version()
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
