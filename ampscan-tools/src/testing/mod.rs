//! Test doubles for the external tools
//!
//! Used by this crate's tests and by downstream crates that want to run the
//! pipeline without a real model or search binary.

pub mod mock;

pub use mock::{MockScorer, MockSearcher};

use ampscan_core::HomologyHit;

/// Minimal hit with the fields the annotation join reads
pub fn hit(query_id: &str, subject: &str, e_value: f64, bitscore: f64) -> HomologyHit {
    HomologyHit {
        query_id: query_id.to_string(),
        subject_id: subject.to_string(),
        identity_pct: 100.0,
        alignment_length: 20,
        e_value,
        bitscore,
        mismatches: 0,
        gap_opens: 0,
        query_span: (1, 20),
        subject_span: (1, 20),
        subject_strand: "N/A".to_string(),
        subject_frame: 0,
        subject_title: subject.to_string(),
    }
}
