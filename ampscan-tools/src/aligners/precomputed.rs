//! Hit tables produced outside ampscan

use crate::aligners::blast::read_hits;
use crate::traits::HomologySearch;
use ampscan_bio::SequenceRecord;
use ampscan_core::{AmpscanResult, HomologyHit};
use std::collections::HashSet;
use std::path::Path;

/// Serves hits from an existing tabular file instead of running a search.
///
/// Only hits whose query id is the short key of one of the queries are
/// returned; the database argument is ignored.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedHits {
    hits: Vec<HomologyHit>,
}

impl PrecomputedHits {
    pub fn new(hits: Vec<HomologyHit>) -> Self {
        Self { hits }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> AmpscanResult<Self> {
        let hits = read_hits(&path)?;
        tracing::info!(
            "Loaded {} precomputed hits from {}",
            hits.len(),
            path.as_ref().display()
        );
        Ok(Self::new(hits))
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl HomologySearch for PrecomputedHits {
    fn search(
        &mut self,
        queries: &[SequenceRecord],
        _database: &[SequenceRecord],
    ) -> AmpscanResult<Vec<HomologyHit>> {
        let keys: HashSet<&str> = queries.iter().map(|q| q.short_key()).collect();
        Ok(self
            .hits
            .iter()
            .filter(|hit| keys.contains(hit.query_id.as_str()))
            .cloned()
            .collect())
    }

    fn version(&self) -> AmpscanResult<String> {
        Ok("precomputed".to_string())
    }

    fn is_available(&self) -> bool {
        true
    }
}
