//! Mock scorer and searcher

use crate::traits::{HomologySearch, Scorer};
use ampscan_bio::SequenceRecord;
use ampscan_core::{AmpscanError, AmpscanResult, HomologyHit};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Scorer returning fixed probabilities keyed by short key
pub struct MockScorer {
    default: f64,
    scores: HashMap<String, f64>,
    available: bool,
    drop_last: bool,
    batches: AtomicUsize,
}

impl MockScorer {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            scores: HashMap::new(),
            available: true,
            drop_last: false,
            batches: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(0.0)
        }
    }

    pub fn with_score(mut self, short_key: &str, probability: f64) -> Self {
        self.scores.insert(short_key.to_string(), probability);
        self
    }

    /// Return one score too few per batch
    pub fn dropping_last_score(mut self) -> Self {
        self.drop_last = true;
        self
    }

    /// Number of `score_batch` calls so far
    pub fn batches_scored(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

impl Scorer for MockScorer {
    fn identity(&self) -> String {
        let mut scores: Vec<_> = self.scores.iter().collect();
        scores.sort_by(|a, b| a.0.cmp(b.0));
        format!("mock default={} {:?}", self.default, scores)
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn score_batch(&self, batch: &[SequenceRecord]) -> AmpscanResult<Vec<f64>> {
        if !self.available {
            return Err(AmpscanError::ScorerUnavailable("mock scorer disabled".to_string()));
        }
        self.batches.fetch_add(1, Ordering::SeqCst);

        let mut scores: Vec<f64> = batch
            .iter()
            .map(|record| {
                self.scores
                    .get(record.short_key())
                    .copied()
                    .unwrap_or(self.default)
            })
            .collect();
        if self.drop_last {
            scores.pop();
        }
        Ok(scores)
    }
}

/// Searcher returning canned hits for the queries it is given
pub struct MockSearcher {
    hits: Vec<HomologyHit>,
    available: bool,
    calls: usize,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MockSearcher {
    pub fn new(hits: Vec<HomologyHit>) -> Self {
        Self {
            hits,
            available: true,
            calls: 0,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl HomologySearch for MockSearcher {
    fn search(
        &mut self,
        queries: &[SequenceRecord],
        _database: &[SequenceRecord],
    ) -> AmpscanResult<Vec<HomologyHit>> {
        if !self.available {
            return Err(AmpscanError::SearchUnavailable("mock searcher disabled".to_string()));
        }
        self.calls += 1;

        let keys: HashSet<&str> = queries.iter().map(|q| q.short_key()).collect();
        Ok(self
            .hits
            .iter()
            .filter(|hit| keys.contains(hit.query_id.as_str()))
            .cloned()
            .collect())
    }

    fn version(&self) -> AmpscanResult<String> {
        Ok("MockSearcher 1.0.0".to_string())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}
