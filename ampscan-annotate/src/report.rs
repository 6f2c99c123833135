//! Counts and descriptions derived from annotated records

use crate::engine::AnnotatedRecord;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::hash::Hash;

/// Ordered key to count map; keys keep first-seen order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountSummary<K: Hash + Eq> {
    counts: IndexMap<K, usize>,
}

impl<K: Hash + Eq> Default for CountSummary<K> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }
}

impl<K: Hash + Eq> CountSummary<K> {
    pub fn increment(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn get(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &usize)> {
        self.counts.iter()
    }

    /// Reorder by descending count; equal counts keep their relative order
    pub fn sorted_by_count(mut self) -> Self {
        self.counts.sort_by(|_, a, _, b| b.cmp(a));
        self
    }
}

impl<K: Hash + Eq> FromIterator<K> for CountSummary<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut summary = Self::default();
        for key in iter {
            summary.increment(key);
        }
        summary
    }
}

/// Two-column `key<TAB>count` rendering, one line per key
impl<K: Hash + Eq + fmt::Display> fmt::Display for CountSummary<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, count) in &self.counts {
            writeln!(f, "{}\t{}", key, count)?;
        }
        Ok(())
    }
}

pub fn count_by<T, K, F>(items: &[T], key_fn: F) -> CountSummary<K>
where
    K: Hash + Eq,
    F: Fn(&T) -> K,
{
    items.iter().map(key_fn).collect()
}

/// Records with and without a homolog
pub fn homolog_summary(records: &[AnnotatedRecord]) -> CountSummary<bool> {
    count_by(records, |r| r.has_homolog())
}

/// Free-text description embedded in a header.
///
/// Returns the text after the first space and before the first `marker`
/// that follows it, trimmed. `None` when either delimiter is missing or
/// nothing is left.
pub fn describe(header: &str, marker: &str) -> Option<String> {
    let (_, rest) = header.split_once(' ')?;
    if marker.is_empty() {
        return None;
    }
    let (description, _) = rest.split_once(marker)?;
    let description = description.trim();
    if description.is_empty() {
        None
    } else {
        Some(description.to_string())
    }
}
