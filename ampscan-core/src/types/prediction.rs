use crate::error::{AmpscanError, AmpscanResult, Stage};
use serde::{Deserialize, Serialize};

/// Classifier output for one sequence.
///
/// `seq_id` is the full header of the scored sequence, not its short key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub seq_id: String,
    pub probability: f64,
}

impl PredictionRecord {
    /// Build a record, rejecting probabilities outside [0, 1]
    pub fn new(seq_id: impl Into<String>, probability: f64) -> AmpscanResult<Self> {
        let seq_id = seq_id.into();
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(AmpscanError::malformed(
                Stage::Classify,
                format!(
                    "probability {} for '{}' is outside [0, 1]",
                    probability, seq_id
                ),
            ));
        }
        Ok(Self {
            seq_id,
            probability,
        })
    }

    pub fn passes(&self, threshold: f64) -> bool {
        self.probability > threshold
    }
}
