//! On-disk cache of classifier scores keyed by input fingerprint

use ampscan_bio::{fingerprint_records, SequenceRecord};
use ampscan_core::types::{Fingerprint, Fingerprinter};
use ampscan_core::{AmpscanError, AmpscanResult, PredictionRecord};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fingerprint: Fingerprint,
    scorer: String,
    records: Vec<PredictionRecord>,
}

/// Directory of cached score sets, one JSON file per fingerprint.
///
/// An entry is only reused when the input set is exactly the one it was
/// computed from; there is no partial reuse.
#[derive(Debug, Clone)]
pub struct ScoreCache {
    dir: PathBuf,
}

impl ScoreCache {
    pub fn new(dir: impl Into<PathBuf>) -> AmpscanResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Fingerprint of a scorer identity together with an ordered input set
    pub fn key(scorer_identity: &str, sequences: &[SequenceRecord]) -> Fingerprint {
        let mut fingerprinter = Fingerprinter::new();
        fingerprinter
            .field(scorer_identity.as_bytes())
            .field(&fingerprint_records(sequences).0);
        fingerprinter.finish()
    }

    fn entry_path(&self, key: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{}.json", key.to_hex()))
    }

    /// Cached records for `sequences`, if a fully matching entry exists
    pub fn load(
        &self,
        key: &Fingerprint,
        sequences: &[SequenceRecord],
    ) -> Option<Vec<PredictionRecord>> {
        let path = self.entry_path(key);
        let contents = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&contents) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        let matches = entry.fingerprint == *key
            && entry.records.len() == sequences.len()
            && entry
                .records
                .iter()
                .zip(sequences)
                .all(|(record, sequence)| record.seq_id == sequence.id());

        if !matches {
            tracing::debug!("Cache entry {} does not match the current input", path.display());
            return None;
        }

        if let Some(bad) = entry
            .records
            .iter()
            .find(|r| !(0.0..=1.0).contains(&r.probability))
        {
            tracing::warn!(
                "Ignoring cache entry {}: probability {} for '{}' is outside [0, 1]",
                path.display(),
                bad.probability,
                bad.seq_id
            );
            return None;
        }
        Some(entry.records)
    }

    /// Write an entry atomically so a crash never leaves a truncated file
    pub fn store(
        &self,
        key: &Fingerprint,
        scorer_identity: &str,
        records: &[PredictionRecord],
    ) -> AmpscanResult<()> {
        let entry = CacheEntry {
            fingerprint: *key,
            scorer: scorer_identity.to_string(),
            records: records.to_vec(),
        };

        let mut temp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut temp, &entry)?;
        temp.flush()?;
        temp.persist(self.entry_path(key))
            .map_err(|e| AmpscanError::Io(e.error))?;

        tracing::debug!("Cached {} scores under {}", records.len(), key);
        Ok(())
    }

    /// Remove every cached entry, returning how many were deleted
    pub fn clear(&self) -> AmpscanResult<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
