//! Scorer backed by an external executable
//!
//! Each batch is written to a FASTA file whose headers are the batch
//! indices `0..n`, the command is run with `{input}` and `{output}`
//! substituted into its argument template, and the delimited result table
//! is mapped back to the batch by index. Original headers never reach the
//! tool, so arbitrary header text cannot confuse its parser.

use crate::process::{resolve_binary, run_tool};
use crate::traits::Scorer;
use ampscan_bio::SequenceRecord;
use ampscan_core::config::{parse_delimiter, ClassifierConfig};
use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::UNIX_EPOCH;

const INPUT_PLACEHOLDER: &str = "{input}";
const OUTPUT_PLACEHOLDER: &str = "{output}";

pub struct CommandScorer {
    command: String,
    binary: Option<PathBuf>,
    args: Vec<String>,
    id_column: String,
    probability_column: String,
    delimiter: u8,
    batch_size: usize,
}

impl CommandScorer {
    pub fn from_config(config: &ClassifierConfig) -> AmpscanResult<Self> {
        let delimiter = parse_delimiter(&config.delimiter)?;
        let binary = resolve_binary(&config.command);
        if binary.is_none() {
            tracing::debug!("Scorer command '{}' not found on PATH", config.command);
        }

        Ok(Self {
            command: config.command.clone(),
            binary,
            args: config.args.clone(),
            id_column: config.id_column.clone(),
            probability_column: config.probability_column.clone(),
            delimiter,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Resolved executable, if any
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    fn build_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let input = input.to_string_lossy();
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(INPUT_PLACEHOLDER, &input)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    fn write_batch(path: &Path, batch: &[SequenceRecord]) -> AmpscanResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        for (index, record) in batch.iter().enumerate() {
            writeln!(writer, ">{}", index)?;
            writeln!(writer, "{}", record.sequence())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Map the scorer's result table back onto batch positions
    fn parse_scores(&self, path: &Path, batch: &[SequenceRecord]) -> AmpscanResult<Vec<f64>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| scorer_output_error(format!("cannot open {}: {}", path.display(), e)))?;

        let headers = reader
            .headers()
            .map_err(|e| scorer_output_error(format!("cannot read header row: {}", e)))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| scorer_output_error(format!("column '{}' is missing", name)))
        };
        let id_idx = column(&self.id_column)?;
        let prob_idx = column(&self.probability_column)?;

        let mut scores: Vec<Option<f64>> = vec![None; batch.len()];
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| scorer_output_error(format!("row {}: {}", row + 1, e)))?;
            let raw_id = record.get(id_idx).unwrap_or("").trim();
            let raw_prob = record.get(prob_idx).unwrap_or("").trim();

            let index: usize = raw_id
                .parse()
                .ok()
                .filter(|i| *i < batch.len())
                .ok_or_else(|| {
                    scorer_output_error(format!("row {}: unknown sequence index '{}'", row + 1, raw_id))
                })?;
            let probability: f64 = raw_prob.parse().map_err(|_| {
                scorer_output_error(format!(
                    "row {}: probability '{}' for '{}' is not a number",
                    row + 1,
                    raw_prob,
                    batch[index].id()
                ))
            })?;

            if scores[index].replace(probability).is_some() {
                return Err(scorer_output_error(format!(
                    "'{}' was scored more than once",
                    batch[index].id()
                )));
            }
        }

        scores
            .into_iter()
            .enumerate()
            .map(|(index, score)| {
                score.ok_or_else(|| {
                    scorer_output_error(format!("no score returned for '{}'", batch[index].id()))
                })
            })
            .collect()
    }
}

fn scorer_output_error(message: String) -> AmpscanError {
    AmpscanError::malformed(Stage::Classify, format!("scorer output: {}", message))
}

impl Scorer for CommandScorer {
    /// Command line plus the executable's size and mtime, so replacing the
    /// model binary invalidates cached scores
    fn identity(&self) -> String {
        let mut identity = format!("{} {}", self.command, self.args.join(" "));
        if let Some(meta) = self.binary.as_ref().and_then(|b| fs::metadata(b).ok()) {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0);
            identity.push_str(&format!(" [{} bytes, mtime {}]", meta.len(), mtime));
        }
        identity
    }

    fn is_available(&self) -> bool {
        self.binary.is_some()
    }

    fn score_batch(&self, batch: &[SequenceRecord]) -> AmpscanResult<Vec<f64>> {
        let binary = self.binary.as_ref().ok_or_else(|| {
            AmpscanError::ScorerUnavailable(format!("'{}' not found", self.command))
        })?;

        let work_dir = tempfile::Builder::new().prefix("ampscan-score-").tempdir()?;
        let input = work_dir.path().join("batch.fasta");
        let output = work_dir.path().join("scores.tsv");
        Self::write_batch(&input, batch)?;

        let mut cmd = Command::new(binary);
        cmd.args(self.build_args(&input, &output));
        run_tool(&mut cmd, &self.command).map_err(AmpscanError::ScorerUnavailable)?;

        if !output.exists() {
            return Err(AmpscanError::ScorerUnavailable(format!(
                "{} exited successfully but wrote no output to {}",
                self.command,
                output.display()
            )));
        }
        self.parse_scores(&output, batch)
    }

    fn recommended_batch_size(&self) -> usize {
        self.batch_size
    }
}
