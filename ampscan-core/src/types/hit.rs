use serde::{Deserialize, Serialize};

/// One alignment reported by the homology search.
///
/// A query with no hits simply produces no `HomologyHit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomologyHit {
    pub query_id: String,
    pub subject_id: String,
    pub identity_pct: f64,
    pub alignment_length: u32,
    pub e_value: f64,
    pub bitscore: f64,
    pub mismatches: u32,
    pub gap_opens: u32,
    pub query_span: (u32, u32),
    pub subject_span: (u32, u32),
    pub subject_strand: String,
    pub subject_frame: i32,
    pub subject_title: String,
}

impl HomologyHit {
    /// Accession from a `db|ACCESSION|NAME` style subject id, or the id itself
    pub fn subject_accession(&self) -> &str {
        let mut parts = self.subject_id.split('|');
        match (parts.next(), parts.next()) {
            (Some(_db), Some(acc)) if !acc.is_empty() => acc,
            _ => &self.subject_id,
        }
    }
}
