use crate::sequence::SequenceRecord;
use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use flate2::read::MultiGzDecoder;
use nom::{
    bytes::complete::{tag, take_till},
    combinator::opt,
    IResult,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Take one line, consuming its `\n` terminator if present
fn next_line(input: &[u8]) -> IResult<&[u8], &[u8]> {
    let (input, line) = take_till(|c: u8| c == b'\n')(input)?;
    let (input, _) = opt(tag(b"\n"))(input)?;
    Ok((input, line.strip_suffix(b"\r").unwrap_or(line)))
}

fn malformed(message: String) -> AmpscanError {
    AmpscanError::malformed(Stage::Ingest, message)
}

/// Gzip is detected from the stream's magic bytes, not the file name
fn decompress_if_needed(data: &[u8]) -> AmpscanResult<Option<Vec<u8>>> {
    if !data.starts_with(&GZIP_MAGIC) {
        return Ok(None);
    }
    let mut buffer = Vec::new();
    MultiGzDecoder::new(data)
        .read_to_end(&mut buffer)
        .map_err(|e| malformed(format!("invalid gzip stream: {}", e)))?;
    Ok(Some(buffer))
}

struct PendingRecord {
    header: String,
    header_line: usize,
    residues: String,
}

impl PendingRecord {
    fn finish(self) -> AmpscanResult<SequenceRecord> {
        if self.residues.is_empty() {
            return Err(malformed(format!(
                "line {}: header '{}' is not followed by any residue line",
                self.header_line, self.header
            )));
        }
        SequenceRecord::new(self.header, self.residues).map_err(|e| match e {
            AmpscanError::MalformedInput { stage, message } => AmpscanError::MalformedInput {
                stage,
                message: format!("line {}: {}", self.header_line, message),
            },
            other => other,
        })
    }
}

/// Parse FASTA from bytes, decompressing gzip input transparently
pub fn parse_fasta_bytes(data: &[u8]) -> AmpscanResult<Vec<SequenceRecord>> {
    let decompressed = decompress_if_needed(data)?;
    let data = decompressed.as_deref().unwrap_or(data);
    let text = std::str::from_utf8(data)
        .map_err(|e| malformed(format!("input is not valid UTF-8: {}", e)))?;

    let mut records = Vec::new();
    let mut current: Option<PendingRecord> = None;
    let mut remaining = text.as_bytes();
    let mut line_no = 0usize;

    while !remaining.is_empty() {
        let (rest, line) = next_line(remaining)
            .map_err(|e| malformed(format!("line {}: {:?}", line_no + 1, e)))?;
        remaining = rest;
        line_no += 1;

        // Lines are sub-slices of validated UTF-8 split on ASCII bytes
        let line = String::from_utf8_lossy(line);

        if let Some(header) = line.strip_prefix('>') {
            if let Some(pending) = current.take() {
                records.push(pending.finish()?);
            }
            current = Some(PendingRecord {
                header: header.to_string(),
                header_line: line_no,
                residues: String::new(),
            });
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        match current.as_mut() {
            Some(pending) => pending
                .residues
                .extend(line.chars().filter(|c| !c.is_whitespace())),
            None => {
                return Err(malformed(format!(
                    "line {}: sequence data appears before any header",
                    line_no
                )))
            }
        }
    }

    if let Some(pending) = current.take() {
        records.push(pending.finish()?);
    }

    check_identifiers(&records)?;
    tracing::debug!("Parsed {} FASTA records", records.len());
    Ok(records)
}

/// Ids must be unique; short-key collisions are legal but make joins ambiguous
fn check_identifiers(records: &[SequenceRecord]) -> AmpscanResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut short_keys: HashMap<&str, &str> = HashMap::with_capacity(records.len());

    for record in records {
        if !seen.insert(record.id()) {
            return Err(malformed(format!("duplicate record id '{}'", record.id())));
        }
        if let Some(first) = short_keys.insert(record.short_key(), record.id()) {
            tracing::warn!(
                "Headers '{}' and '{}' share the short key '{}'",
                first,
                record.id(),
                record.short_key()
            );
        }
    }
    Ok(())
}

/// Read a FASTA file, compressed or not
pub fn read_fasta<P: AsRef<Path>>(path: P) -> AmpscanResult<Vec<SequenceRecord>> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    parse_fasta_bytes(&data).map_err(|e| match e {
        AmpscanError::MalformedInput { stage, message } => AmpscanError::MalformedInput {
            stage,
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Serialize records; `line_width` of 0 writes each sequence on one line
pub fn serialize_fasta(records: &[SequenceRecord], line_width: usize) -> Vec<u8> {
    let chunks: Vec<Vec<u8>> = records
        .par_chunks(1000)
        .map(|chunk| {
            let estimated: usize = chunk
                .iter()
                .map(|r| r.id().len() + r.len() + r.len() / line_width.max(1) + 4)
                .sum();
            let mut buffer = Vec::with_capacity(estimated);

            for record in chunk {
                buffer.push(b'>');
                buffer.extend_from_slice(record.id().as_bytes());
                buffer.push(b'\n');

                let residues = record.sequence().as_bytes();
                if line_width == 0 {
                    buffer.extend_from_slice(residues);
                    buffer.push(b'\n');
                } else {
                    for line in residues.chunks(line_width) {
                        buffer.extend_from_slice(line);
                        buffer.push(b'\n');
                    }
                }
            }
            buffer
        })
        .collect();

    chunks.concat()
}

/// Write records to a FASTA file (gzip-compressed for a `.gz` path)
pub fn write_fasta<P: AsRef<Path>>(
    path: P,
    records: &[SequenceRecord],
    line_width: usize,
) -> AmpscanResult<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    let file = File::create(path)?;
    let bytes = serialize_fasta(records, line_width);

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encoder.write_all(&bytes)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, seq: &str) -> SequenceRecord {
        SequenceRecord::new(id, seq).unwrap()
    }

    #[test]
    fn test_next_line() {
        let (rest, line) = next_line(b">P1 desc\r\nACGT").unwrap();
        assert_eq!(line, b">P1 desc");
        assert_eq!(rest, b"ACGT");

        let (rest, line) = next_line(b"ACGT").unwrap();
        assert_eq!(line, b"ACGT");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_parse_multiline_records() {
        let input = b">P1 Defensin OS=Homo sapiens\nATCC\nYCRT\n\n>P2\nGIGK\n";
        let records = parse_fasta_bytes(input).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id(), "P1 Defensin OS=Homo sapiens");
        assert_eq!(records[0].sequence(), "ATCCYCRT");
        assert_eq!(records[1].id(), "P2");
        assert_eq!(records[1].sequence(), "GIGK");
    }

    #[test]
    fn test_header_kept_verbatim() {
        let input = b">sp|P59665|DEF1_HUMAN  Neutrophil defensin 1  PE=1 SV=1\nACYC\n";
        let records = parse_fasta_bytes(input).unwrap();
        assert_eq!(
            records[0].id(),
            "sp|P59665|DEF1_HUMAN  Neutrophil defensin 1  PE=1 SV=1"
        );
    }

    #[test]
    fn test_windows_line_endings() {
        let records = parse_fasta_bytes(b">P1 x\r\nAC\r\nGT\r\n").unwrap();
        assert_eq!(records[0].id(), "P1 x");
        assert_eq!(records[0].sequence(), "ACGT");
    }

    #[test]
    fn test_header_without_residues_is_malformed() {
        for input in [&b">P1\n>P2\nACGT\n"[..], &b">P1\nACGT\n>P2\n"[..], &b">P1\n\n\n"[..]] {
            match parse_fasta_bytes(input) {
                Err(AmpscanError::MalformedInput { stage, message }) => {
                    assert_eq!(stage, Stage::Ingest);
                    assert!(message.contains("not followed by any residue line"));
                }
                other => panic!("Expected MalformedInput, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_residues_before_header_is_malformed() {
        match parse_fasta_bytes(b"ACGT\n>P1\nACGT\n") {
            Err(AmpscanError::MalformedInput { message, .. }) => {
                assert!(message.contains("line 1"));
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_non_ascii_residue_is_malformed() {
        match parse_fasta_bytes(">P1 desc\nA\u{e9}B\n".as_bytes()) {
            Err(AmpscanError::MalformedInput { stage, message }) => {
                assert_eq!(stage, Stage::Ingest);
                assert!(message.contains("line 1"));
                assert!(message.contains("invalid residue"));
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_output_parses_back_with_non_ascii_header() {
        let records = vec![
            record("P1 \u{3b1}-defensin \u{e9}", "ACYCRIPACIAGERRYGTC"),
            record("P2", "G"),
        ];
        for width in [1, 2, 7] {
            let bytes = serialize_fasta(&records, width);
            assert_eq!(parse_fasta_bytes(&bytes).unwrap(), records);
        }
    }

    #[test]
    fn test_duplicate_ids_are_malformed() {
        assert!(matches!(
            parse_fasta_bytes(b">P1\nAC\n>P1\nGT\n"),
            Err(AmpscanError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_fasta_bytes(b"").unwrap().is_empty());
        assert!(parse_fasta_bytes(b"\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_gzip_detected_by_magic() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b">P1 compressed\nMKV\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let records = parse_fasta_bytes(&compressed).unwrap();
        assert_eq!(records, vec![record("P1 compressed", "MKV")]);
    }

    #[test]
    fn test_truncated_gzip_is_malformed() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&b">P1\nMKV\n".repeat(100)).unwrap();
        let compressed = encoder.finish().unwrap();
        let truncated = &compressed[..compressed.len() / 2];

        assert!(matches!(
            parse_fasta_bytes(truncated),
            Err(AmpscanError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_serialize_wraps_lines() {
        let records = vec![record("P1 desc", "ABCDEFG")];
        assert_eq!(serialize_fasta(&records, 3), b">P1 desc\nABC\nDEF\nG\n".to_vec());
        assert_eq!(serialize_fasta(&records, 0), b">P1 desc\nABCDEFG\n".to_vec());
    }
}
