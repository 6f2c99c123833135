//! Reference metadata table keyed by accession
//!
//! The table is any delimited file with a header row. One column holds the
//! accession; every other column becomes a named attribute. Rows keep their
//! first occurrence when an accession repeats.

use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use flate2::read::MultiGzDecoder;
use indexmap::IndexMap;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Annotation columns for one reference accession
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceMetadata {
    pub accession: String,
    pub attributes: IndexMap<String, String>,
}

impl ReferenceMetadata {
    pub fn new(accession: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Immutable lookup of reference metadata by accession
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    columns: Vec<String>,
    rows: IndexMap<String, ReferenceMetadata>,
    duplicates: usize,
}

impl ReferenceTable {
    /// Empty table with the given attribute columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: IndexMap::new(),
            duplicates: 0,
        }
    }

    /// Build from rows; attribute columns are taken in first-seen order
    pub fn from_rows(rows: impl IntoIterator<Item = ReferenceMetadata>) -> Self {
        let mut table = Self::default();
        for row in rows {
            for name in row.attributes.keys() {
                if !table.columns.contains(name) {
                    table.columns.push(name.clone());
                }
            }
            table.insert(row);
        }
        table
    }

    /// Insert a row unless the accession is already present
    pub fn insert(&mut self, row: ReferenceMetadata) -> bool {
        if self.rows.contains_key(&row.accession) {
            self.duplicates += 1;
            return false;
        }
        self.rows.insert(row.accession.clone(), row);
        true
    }

    pub fn get(&self, accession: &str) -> Option<&ReferenceMetadata> {
        self.rows.get(accession)
    }

    /// Attribute column names, excluding the accession column
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows dropped because their accession was already loaded
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceMetadata> {
        self.rows.values()
    }

    /// Load from any reader with a header row
    pub fn from_reader<R: Read>(
        reader: R,
        accession_column: &str,
        delimiter: u8,
    ) -> AmpscanResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| metadata_error(format!("cannot read header row: {}", e)))?
            .clone();
        let accession_idx = headers
            .iter()
            .position(|h| h.trim() == accession_column)
            .ok_or_else(|| {
                metadata_error(format!(
                    "accession column '{}' not found in header ({})",
                    accession_column,
                    headers.iter().collect::<Vec<_>>().join(", ")
                ))
            })?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != accession_idx)
            .map(|(_, h)| h.trim().to_string())
            .collect();
        let mut table = Self::new(columns);
        let mut skipped = 0usize;

        for result in csv_reader.records() {
            let record = result.map_err(|e| {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                metadata_error(format!("line {}: {}", line, e))
            })?;

            let accession = record.get(accession_idx).unwrap_or("").trim();
            if accession.is_empty() {
                skipped += 1;
                continue;
            }

            let mut row = ReferenceMetadata::new(accession);
            for (i, value) in record.iter().enumerate() {
                if i != accession_idx {
                    row.attributes
                        .insert(headers[i].trim().to_string(), value.to_string());
                }
            }

            if !table.insert(row) {
                tracing::debug!("Ignoring repeated accession '{}'", accession);
            }
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} metadata rows with an empty accession", skipped);
        }
        if table.duplicates > 0 {
            tracing::warn!(
                "{} metadata rows repeat an earlier accession; the first occurrence was kept",
                table.duplicates
            );
        }
        tracing::info!(
            "Loaded {} reference accessions with {} attribute columns",
            table.len(),
            table.columns.len()
        );
        Ok(table)
    }

    /// Load from a file. The delimiter defaults to tab for `.tsv`/`.tab`
    /// files and comma otherwise; gzip input is detected and decompressed.
    pub fn read<P: AsRef<Path>>(
        path: P,
        accession_column: &str,
        delimiter: Option<u8>,
    ) -> AmpscanResult<Self> {
        let path = path.as_ref();
        let delimiter = delimiter.unwrap_or_else(|| infer_delimiter(path));

        let mut reader = BufReader::new(File::open(path)?);
        let is_gzip = reader.fill_buf()?.starts_with(&[0x1f, 0x8b]);
        let reader: Box<dyn Read> = if is_gzip {
            Box::new(MultiGzDecoder::new(reader))
        } else {
            Box::new(reader)
        };

        Self::from_reader(reader, accession_column, delimiter).map_err(|e| match e {
            AmpscanError::MalformedInput { stage, message } => AmpscanError::MalformedInput {
                stage,
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }
}

fn metadata_error(message: String) -> AmpscanError {
    AmpscanError::malformed(Stage::Metadata, message)
}

fn infer_delimiter(path: &Path) -> u8 {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    if name.ends_with(".tsv") || name.ends_with(".tab") {
        b'\t'
    } else {
        b','
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_reader_keeps_column_order() {
        let data = "Entry\tEntry Name\tProtein families\nP59665\tDEF1_HUMAN\tAlpha-defensin family\n";
        let table = ReferenceTable::from_reader(data.as_bytes(), "Entry", b'\t').unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.columns(), &["Entry Name".to_string(), "Protein families".to_string()]);
        let row = table.get("P59665").unwrap();
        assert_eq!(row.attribute("Entry Name"), Some("DEF1_HUMAN"));
        assert_eq!(row.attribute("Protein families"), Some("Alpha-defensin family"));
    }

    #[test]
    fn test_first_duplicate_wins() {
        let data = "accession,family\nM1,defensin\nM1,cathelicidin\nM2,histatin\n";
        let table = ReferenceTable::from_reader(data.as_bytes(), "accession", b',').unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.duplicates(), 1);
        assert_eq!(table.get("M1").unwrap().attribute("family"), Some("defensin"));
    }

    #[test]
    fn test_missing_accession_column() {
        let data = "id,family\nM1,defensin\n";
        match ReferenceTable::from_reader(data.as_bytes(), "accession", b',') {
            Err(AmpscanError::MalformedInput { stage, message }) => {
                assert_eq!(stage, Stage::Metadata);
                assert!(message.contains("accession column 'accession' not found"));
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_row_is_malformed() {
        let data = "accession,family\nM1,defensin,extra\n";
        assert!(matches!(
            ReferenceTable::from_reader(data.as_bytes(), "accession", b','),
            Err(AmpscanError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_empty_accessions_skipped() {
        let data = "accession,family\n,orphan\nM1,defensin\n";
        let table = ReferenceTable::from_reader(data.as_bytes(), "accession", b',').unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("").is_none());
    }

    #[test]
    fn test_from_rows_collects_columns() {
        let table = ReferenceTable::from_rows(vec![
            ReferenceMetadata::new("M1").with_attribute("family", "defensin"),
            ReferenceMetadata::new("M2").with_attribute("entry_name", "CAMP_HUMAN"),
        ]);
        assert_eq!(table.columns(), &["family".to_string(), "entry_name".to_string()]);
        assert_eq!(table.iter().count(), 2);
    }

    #[test]
    fn test_infer_delimiter() {
        assert_eq!(infer_delimiter(Path::new("uniprot.tsv")), b'\t');
        assert_eq!(infer_delimiter(Path::new("uniprot.TAB.gz")), b'\t');
        assert_eq!(infer_delimiter(Path::new("uniprot.csv")), b',');
        assert_eq!(infer_delimiter(Path::new("uniprot")), b',');
    }
}
