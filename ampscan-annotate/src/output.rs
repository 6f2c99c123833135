//! Writers for the annotated table and count summaries

use crate::engine::AnnotatedRecord;
use crate::report::{describe, CountSummary};
use ampscan_core::error::{AmpscanError, AmpscanResult};
use ampscan_core::OutputFormat;
use std::fmt::Display;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Fixed leading columns of the TSV table; metadata columns follow
pub const TSV_COLUMNS: [&str; 11] = [
    "seq_id",
    "short_key",
    "description",
    "probability",
    "has_homolog",
    "subject_id",
    "identity_pct",
    "alignment_length",
    "e_value",
    "bitscore",
    "subject_title",
];

fn csv_error(e: csv::Error) -> AmpscanError {
    AmpscanError::Serialization(format!("failed to write table: {}", e))
}

/// Tab-separated table, one row per record. Missing values are empty cells.
pub fn write_tsv<W: Write>(
    writer: W,
    records: &[AnnotatedRecord],
    metadata_columns: &[String],
    description_marker: &str,
) -> AmpscanResult<()> {
    let mut table = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    let header = TSV_COLUMNS
        .iter()
        .copied()
        .chain(metadata_columns.iter().map(String::as_str));
    table.write_record(header).map_err(csv_error)?;

    for record in records {
        let hit = record.hit();
        let mut row: Vec<String> = vec![
            record.seq_id().to_string(),
            record.short_key().to_string(),
            describe(record.seq_id(), description_marker).unwrap_or_default(),
            record.probability().to_string(),
            record.has_homolog().to_string(),
            hit.map(|h| h.subject_id.clone()).unwrap_or_default(),
            hit.map(|h| h.identity_pct.to_string()).unwrap_or_default(),
            hit.map(|h| h.alignment_length.to_string()).unwrap_or_default(),
            hit.map(|h| format!("{:e}", h.e_value)).unwrap_or_default(),
            hit.map(|h| h.bitscore.to_string()).unwrap_or_default(),
            hit.map(|h| h.subject_title.clone()).unwrap_or_default(),
        ];
        row.extend(
            metadata_columns
                .iter()
                .map(|column| record.attribute(column).unwrap_or("").to_string()),
        );
        table.write_record(&row).map_err(csv_error)?;
    }

    table.flush()?;
    Ok(())
}

/// Pretty-printed JSON array of records
pub fn write_json<W: Write>(writer: W, records: &[AnnotatedRecord]) -> AmpscanResult<()> {
    let mut writer = writer;
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// `key<TAB>count` table with a header row
pub fn write_summary<W: Write, K: Hash + Eq + Display>(
    writer: W,
    key_name: &str,
    summary: &CountSummary<K>,
) -> AmpscanResult<()> {
    let mut writer = writer;
    writeln!(writer, "{}\tcount", key_name)?;
    write!(writer, "{}", summary)?;
    writer.flush()?;
    Ok(())
}

/// Write records to `path` in the requested format
pub fn write_records(
    path: &Path,
    format: OutputFormat,
    records: &[AnnotatedRecord],
    metadata_columns: &[String],
    description_marker: &str,
) -> AmpscanResult<()> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Tsv => write_tsv(writer, records, metadata_columns, description_marker)?,
        OutputFormat::Json => write_json(writer, records)?,
    }
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}
