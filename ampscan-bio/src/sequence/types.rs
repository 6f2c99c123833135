use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use ampscan_core::types::{Fingerprint, Fingerprinter};
use serde::Serialize;
use std::fmt;

/// One entry of a sequence container: the full header line and its residues.
///
/// Fields are private so a record can only exist in a valid state: the header
/// has an identifier token and no line break, and the residues are non-empty
/// printable ASCII other than `>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SequenceRecord {
    id: String,
    sequence: String,
}

impl SequenceRecord {
    pub fn new(id: impl Into<String>, sequence: impl Into<String>) -> AmpscanResult<Self> {
        let id = id.into();
        let sequence = sequence.into();

        if id.contains(['\n', '\r']) {
            return Err(AmpscanError::malformed(
                Stage::Ingest,
                format!("header {:?} contains a line break", id),
            ));
        }
        if short_key(&id).is_empty() {
            return Err(AmpscanError::malformed(
                Stage::Ingest,
                "header has no identifier token",
            ));
        }
        if sequence.is_empty() {
            return Err(AmpscanError::malformed(
                Stage::Ingest,
                format!("record '{}' has no residues", short_key(&id)),
            ));
        }
        if let Some(bad) = sequence
            .chars()
            .find(|c| !c.is_ascii_graphic() || *c == '>')
        {
            return Err(AmpscanError::malformed(
                Stage::Ingest,
                format!(
                    "record '{}' contains invalid residue {:?}",
                    short_key(&id),
                    bad
                ),
            ));
        }

        Ok(Self { id, sequence })
    }

    /// Full header text, without the leading `>`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Join key against homology hits
    pub fn short_key(&self) -> &str {
        short_key(&self.id)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always false for a constructed record; kept for slice-like symmetry
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

impl fmt::Display for SequenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}\n{}", self.id, self.sequence)
    }
}

/// Reduce a header to its leading whitespace-delimited token.
///
/// Pure and idempotent: `short_key(short_key(h)) == short_key(h)`.
pub fn short_key(header: &str) -> &str {
    header.split_whitespace().next().unwrap_or("")
}

/// Content fingerprint of an ordered record set
pub fn fingerprint_records(records: &[SequenceRecord]) -> Fingerprint {
    let mut fingerprinter = Fingerprinter::new();
    fingerprinter.field(&(records.len() as u64).to_le_bytes());
    for record in records {
        fingerprinter
            .field(record.id.as_bytes())
            .field(record.sequence.as_bytes());
    }
    fingerprinter.finish()
}
