//! Threshold filter and the two left joins

use ampscan_bio::{short_key, ReferenceTable};
use ampscan_core::config::MetadataKey;
use ampscan_core::error::{AmpscanError, AmpscanResult};
use ampscan_core::{HomologyHit, PredictionRecord};
use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;

/// One passing prediction with its best hit and that hit's metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedRecord {
    prediction: PredictionRecord,
    short_key: String,
    hit: Option<HomologyHit>,
    attributes: IndexMap<String, String>,
    has_homolog: bool,
}

impl AnnotatedRecord {
    pub fn prediction(&self) -> &PredictionRecord {
        &self.prediction
    }

    pub fn seq_id(&self) -> &str {
        &self.prediction.seq_id
    }

    pub fn probability(&self) -> f64 {
        self.prediction.probability
    }

    pub fn short_key(&self) -> &str {
        &self.short_key
    }

    pub fn hit(&self) -> Option<&HomologyHit> {
        self.hit.as_ref()
    }

    /// Metadata of the matched reference; empty when nothing matched
    pub fn attributes(&self) -> &IndexMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_homolog(&self) -> bool {
        self.has_homolog
    }
}

/// `true` when `candidate` should replace `current` as a query's best hit.
///
/// Lower e-value wins, then higher bitscore; a full tie keeps `current`,
/// so the first hit encountered is chosen.
fn outranks(candidate: &HomologyHit, current: &HomologyHit) -> bool {
    match candidate.e_value.total_cmp(&current.e_value) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => candidate.bitscore.total_cmp(&current.bitscore) == Ordering::Greater,
    }
}

/// Best hit for each query id
pub fn best_hits(hits: &[HomologyHit]) -> HashMap<&str, &HomologyHit> {
    let mut best: HashMap<&str, &HomologyHit> = HashMap::new();
    for hit in hits {
        best.entry(hit.query_id.as_str())
            .and_modify(|current| {
                if outranks(hit, current) {
                    *current = hit;
                }
            })
            .or_insert(hit);
    }
    best
}

#[derive(Debug, Clone)]
pub struct AnnotationEngine {
    threshold: f64,
    metadata_key: MetadataKey,
}

impl AnnotationEngine {
    /// `threshold` must be finite and within [0, 1]
    pub fn new(threshold: f64) -> AmpscanResult<Self> {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(AmpscanError::InvalidInput(format!(
                "threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self {
            threshold,
            metadata_key: MetadataKey::default(),
        })
    }

    pub fn with_metadata_key(mut self, metadata_key: MetadataKey) -> Self {
        self.metadata_key = metadata_key;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metadata_key(&self) -> MetadataKey {
        self.metadata_key
    }

    /// Predictions strictly above the threshold, in input order
    pub fn filter<'a>(&self, predictions: &'a [PredictionRecord]) -> Vec<&'a PredictionRecord> {
        predictions
            .iter()
            .filter(|p| p.passes(self.threshold))
            .collect()
    }

    fn join_key<'h>(&self, hit: &'h HomologyHit) -> &'h str {
        match self.metadata_key {
            MetadataKey::SubjectTitle => &hit.subject_title,
            MetadataKey::SubjectId => &hit.subject_id,
            MetadataKey::SubjectAccession => hit.subject_accession(),
        }
    }

    /// Filter, then join each passing prediction to its best hit and the
    /// hit's reference metadata. Output has one record per passing
    /// prediction in prediction order; unmatched slots stay empty.
    pub fn annotate(
        &self,
        predictions: &[PredictionRecord],
        hits: &[HomologyHit],
        reference: &ReferenceTable,
    ) -> Vec<AnnotatedRecord> {
        let best = best_hits(hits);
        let passing = self.filter(predictions);

        let records: Vec<AnnotatedRecord> = passing
            .into_iter()
            .map(|prediction| {
                let key = short_key(&prediction.seq_id);
                let hit = best.get(key).map(|h| (*h).clone());
                let attributes = hit
                    .as_ref()
                    .and_then(|h| reference.get(self.join_key(h)))
                    .map(|row| row.attributes.clone())
                    .unwrap_or_default();

                AnnotatedRecord {
                    prediction: prediction.clone(),
                    short_key: key.to_string(),
                    has_homolog: hit.is_some(),
                    hit,
                    attributes,
                }
            })
            .collect();

        let with_hit = records.iter().filter(|r| r.has_homolog).count();
        let with_metadata = records.iter().filter(|r| !r.attributes.is_empty()).count();
        tracing::info!(
            "Annotated {} of {} predictions above {}: {} with a homolog, {} with metadata",
            records.len(),
            predictions.len(),
            self.threshold,
            with_hit,
            with_metadata
        );
        records
    }
}
