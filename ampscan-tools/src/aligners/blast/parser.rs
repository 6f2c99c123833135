//! Reader for the 15-column tabular hit format
//!
//! Rows carry `qseqid sseqid pident length evalue bitscore mismatch gapopen
//! qstart qend sstart send sstrand sframe stitle`, tab-separated, with no
//! header. Blank lines and `#` comments are skipped.

use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use ampscan_core::HomologyHit;
use std::path::Path;
use std::str::FromStr;

/// Column names in the order the search program is asked to emit them
pub const HIT_COLUMNS: [&str; 15] = [
    "qseqid", "sseqid", "pident", "length", "evalue", "bitscore", "mismatch", "gapopen",
    "qstart", "qend", "sstart", "send", "sstrand", "sframe", "stitle",
];

/// `-outfmt` argument requesting [`HIT_COLUMNS`]
pub fn outfmt() -> String {
    format!("6 {}", HIT_COLUMNS.join(" "))
}

fn field<T: FromStr>(fields: &[&str], idx: usize, line_no: usize) -> AmpscanResult<T> {
    let raw = fields[idx].trim();
    raw.parse().map_err(|_| {
        AmpscanError::malformed(
            Stage::Search,
            format!(
                "line {}: column '{}' has unparsable value '{}'",
                line_no, HIT_COLUMNS[idx], raw
            ),
        )
    })
}

fn out_of_range(idx: usize, raw: &str, line_no: usize) -> AmpscanError {
    AmpscanError::malformed(
        Stage::Search,
        format!(
            "line {}: column '{}' has out-of-range value '{}'",
            line_no,
            HIT_COLUMNS[idx],
            raw.trim()
        ),
    )
}

/// Parse one data row; `line_no` is 1-based and only used in errors
pub fn parse_hit_line(line: &str, line_no: usize) -> AmpscanResult<HomologyHit> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != HIT_COLUMNS.len() {
        return Err(AmpscanError::malformed(
            Stage::Search,
            format!(
                "line {}: expected {} tab-separated fields, found {}",
                line_no,
                HIT_COLUMNS.len(),
                fields.len()
            ),
        ));
    }

    let e_value: f64 = field(&fields, 4, line_no)?;
    if !e_value.is_finite() || e_value < 0.0 {
        return Err(out_of_range(4, fields[4], line_no));
    }
    let bitscore: f64 = field(&fields, 5, line_no)?;
    if !bitscore.is_finite() {
        return Err(out_of_range(5, fields[5], line_no));
    }

    Ok(HomologyHit {
        query_id: fields[0].to_string(),
        subject_id: fields[1].to_string(),
        identity_pct: field(&fields, 2, line_no)?,
        alignment_length: field(&fields, 3, line_no)?,
        e_value,
        bitscore,
        mismatches: field(&fields, 6, line_no)?,
        gap_opens: field(&fields, 7, line_no)?,
        query_span: (field(&fields, 8, line_no)?, field(&fields, 9, line_no)?),
        subject_span: (field(&fields, 10, line_no)?, field(&fields, 11, line_no)?),
        subject_strand: fields[12].to_string(),
        subject_frame: field(&fields, 13, line_no)?,
        subject_title: fields[14].to_string(),
    })
}

/// Parse a whole hit table. The first bad row fails the call.
pub fn parse_hits(text: &str) -> AmpscanResult<Vec<HomologyHit>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(idx, line)| parse_hit_line(line, idx + 1))
        .collect()
}

/// Read and parse a hit table from disk
pub fn read_hits<P: AsRef<Path>>(path: P) -> AmpscanResult<Vec<HomologyHit>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    parse_hits(&text).map_err(|e| match e {
        AmpscanError::MalformedInput { stage, message } => AmpscanError::MalformedInput {
            stage,
            message: format!("{}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Render a hit as one row of the tabular format
pub fn format_hit_line(hit: &HomologyHit) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{:e}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        hit.query_id,
        hit.subject_id,
        hit.identity_pct,
        hit.alignment_length,
        hit.e_value,
        hit.bitscore,
        hit.mismatches,
        hit.gap_opens,
        hit.query_span.0,
        hit.query_span.1,
        hit.subject_span.0,
        hit.subject_span.1,
        hit.subject_strand,
        hit.subject_frame,
        hit.subject_title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ROW: &str = "P1\tsp|P59665|DEF1_HUMAN\t93.33\t30\t1e-06\t58.2\t2\t0\t1\t30\t65\t94\tN/A\t0\tM1";

    #[test]
    fn test_outfmt_column_order() {
        assert_eq!(
            outfmt(),
            "6 qseqid sseqid pident length evalue bitscore mismatch gapopen qstart qend sstart send sstrand sframe stitle"
        );
    }

    #[test]
    fn test_parse_hit_line() {
        let hit = parse_hit_line(ROW, 1).unwrap();
        assert_eq!(hit.query_id, "P1");
        assert_eq!(hit.subject_id, "sp|P59665|DEF1_HUMAN");
        assert_eq!(hit.identity_pct, 93.33);
        assert_eq!(hit.alignment_length, 30);
        assert_eq!(hit.e_value, 1e-6);
        assert_eq!(hit.bitscore, 58.2);
        assert_eq!(hit.query_span, (1, 30));
        assert_eq!(hit.subject_span, (65, 94));
        assert_eq!(hit.subject_strand, "N/A");
        assert_eq!(hit.subject_frame, 0);
        assert_eq!(hit.subject_title, "M1");
    }

    #[test]
    fn test_title_may_contain_spaces_and_be_empty() {
        let row = ROW.replace("\tM1", "\tNeutrophil defensin 1 OS=Homo sapiens");
        assert_eq!(
            parse_hit_line(&row, 1).unwrap().subject_title,
            "Neutrophil defensin 1 OS=Homo sapiens"
        );
        let row = ROW.replace("\tM1", "\t");
        assert_eq!(parse_hit_line(&row, 1).unwrap().subject_title, "");
    }

    #[test]
    fn test_wrong_field_count() {
        let short = ROW.rsplit_once('\t').unwrap().0;
        match parse_hit_line(short, 4) {
            Err(AmpscanError::MalformedInput { stage, message }) => {
                assert_eq!(stage, Stage::Search);
                assert!(message.contains("line 4"));
                assert!(message.contains("found 14"));
            }
            other => panic!("Expected MalformedInput, got {:?}", other),
        }
    }

    #[test]
    fn test_unparsable_number_names_column() {
        let row = ROW.replace("1e-06", "tiny");
        let err = parse_hit_line(&row, 2).unwrap_err();
        assert!(err.to_string().contains("'evalue'"));
    }

    #[test]
    fn test_negative_or_nan_evalue_is_malformed() {
        for bad in ["-1e-06", "-nan", "nan", "inf"] {
            let row = ROW.replace("1e-06", bad);
            match parse_hit_line(&row, 3) {
                Err(AmpscanError::MalformedInput { stage, message }) => {
                    assert_eq!(stage, Stage::Search);
                    assert!(message.contains("line 3"));
                    assert!(message.contains("'evalue'"));
                }
                other => panic!("Expected MalformedInput for {}, got {:?}", bad, other),
            }
        }
        let row = ROW.replace("1e-06", "0");
        assert_eq!(parse_hit_line(&row, 1).unwrap().e_value, 0.0);
    }

    #[test]
    fn test_parse_hits_skips_comments_and_fails_whole_call() {
        let text = format!("# BLASTP 2.15.0+\n\n{}\n{}\n", ROW, ROW);
        assert_eq!(parse_hits(&text).unwrap().len(), 2);

        let text = format!("{}\nbroken row\n{}\n", ROW, ROW);
        let err = parse_hits(&text).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_format_then_parse() {
        let hit = parse_hit_line(ROW, 1).unwrap();
        assert_eq!(parse_hit_line(&format_hit_line(&hit), 1).unwrap(), hit);
    }
}
