//! Configuration types for ampscan
//!
//! Everything a run needs is carried in [`Config`] and passed explicitly into
//! the pipeline; nothing is read from ambient process state.

use crate::types::OutputFormat;
use crate::AmpscanError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub annotation: AnnotationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// External scorer executable
    #[serde(default = "default_scorer_command")]
    pub command: String,
    /// Argument template; `{input}` and `{output}` are substituted per batch
    #[serde(default = "default_scorer_args")]
    pub args: Vec<String>,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_probability_column")]
    pub probability_column: String,
    /// Delimiter of the scorer's output table
    #[serde(default = "default_scorer_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_scorer_batch_size")]
    pub batch_size: usize,
    /// Directory for cached scores; caching is off when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_program")]
    pub program: String,
    #[serde(default = "default_index_builder")]
    pub index_builder: String,
    #[serde(default = "default_db_type")]
    pub db_type: String,
    #[serde(default = "default_evalue")]
    pub evalue: f64,
    #[serde(default = "default_max_target_seqs")]
    pub max_target_seqs: usize,
    /// Threads handed to the search program (0 = all cores)
    #[serde(default)]
    pub threads: usize,
    #[serde(default = "default_search_batch_size")]
    pub batch_size: usize,
    /// Where database indexes and per-batch files live; a temp dir when unset
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationConfig {
    /// Probability a prediction must exceed; has no default and must be set
    #[serde(default)]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub metadata_key: MetadataKey,
    #[serde(default = "default_accession_column")]
    pub accession_column: String,
    /// Metadata table delimiter; inferred from the file extension when unset
    #[serde(default)]
    pub metadata_delimiter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Marker closing the descriptive label in a header (`OS=` for UniProt)
    #[serde(default = "default_description_marker")]
    pub description_marker: String,
    #[serde(default = "default_fasta_line_width")]
    pub fasta_line_width: usize,
}

/// Which field of the chosen hit is looked up in the reference metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum MetadataKey {
    #[default]
    SubjectTitle,
    SubjectId,
    /// Accession field of a `db|ACCESSION|NAME` subject id
    SubjectAccession,
}

// Default value functions
fn default_scorer_command() -> String { "amp-scorer".to_string() }
fn default_scorer_args() -> Vec<String> {
    vec!["-i".to_string(), "{input}".to_string(), "-o".to_string(), "{output}".to_string()]
}
fn default_id_column() -> String { "seq_id".to_string() }
fn default_probability_column() -> String { "probability".to_string() }
fn default_scorer_delimiter() -> String { "\t".to_string() }
fn default_scorer_batch_size() -> usize { 5000 }
fn default_search_program() -> String { "blastp".to_string() }
fn default_index_builder() -> String { "makeblastdb".to_string() }
fn default_db_type() -> String { "prot".to_string() }
fn default_evalue() -> f64 { 10.0 }
fn default_max_target_seqs() -> usize { 500 }
fn default_search_batch_size() -> usize { 1000 }
fn default_accession_column() -> String { "accession".to_string() }
fn default_description_marker() -> String { "OS=".to_string() }
fn default_fasta_line_width() -> usize { 60 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: default_scorer_command(),
            args: default_scorer_args(),
            id_column: default_id_column(),
            probability_column: default_probability_column(),
            delimiter: default_scorer_delimiter(),
            batch_size: default_scorer_batch_size(),
            cache_dir: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            program: default_search_program(),
            index_builder: default_index_builder(),
            db_type: default_db_type(),
            evalue: default_evalue(),
            max_target_seqs: default_max_target_seqs(),
            threads: 0,
            batch_size: default_search_batch_size(),
            work_dir: None,
        }
    }
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            metadata_key: MetadataKey::default(),
            accession_column: default_accession_column(),
            metadata_delimiter: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            description_marker: default_description_marker(),
            fasta_line_width: default_fasta_line_width(),
        }
    }
}

/// Parse a single-byte delimiter such as `"\t"` or `","`
pub fn parse_delimiter(value: &str) -> Result<u8, AmpscanError> {
    match value.as_bytes() {
        [b] => Ok(*b),
        _ if value == "\\t" || value.eq_ignore_ascii_case("tab") => Ok(b'\t'),
        _ => Err(AmpscanError::Configuration(format!(
            "delimiter must be a single byte, got {:?}",
            value
        ))),
    }
}

impl Config {
    /// Threshold for the annotation filter; an error when never set
    pub fn threshold(&self) -> Result<f64, AmpscanError> {
        self.annotation.threshold.ok_or_else(|| {
            AmpscanError::Configuration(
                "annotation.threshold must be set explicitly".to_string(),
            )
        })
    }

    pub fn to_toml(&self) -> Result<String, AmpscanError> {
        toml::to_string_pretty(self)
            .map_err(|e| AmpscanError::Configuration(format!("Failed to serialize config: {}", e)))
    }

    /// Check values that serde alone cannot constrain
    pub fn validate(&self) -> Result<(), AmpscanError> {
        if let Some(threshold) = self.annotation.threshold {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(AmpscanError::Configuration(format!(
                    "annotation.threshold must be within [0, 1], got {}",
                    threshold
                )));
            }
        }
        if self.classifier.batch_size == 0 {
            return Err(AmpscanError::Configuration(
                "classifier.batch_size must be positive".to_string(),
            ));
        }
        if self.search.batch_size == 0 {
            return Err(AmpscanError::Configuration(
                "search.batch_size must be positive".to_string(),
            ));
        }
        if self.search.evalue <= 0.0 {
            return Err(AmpscanError::Configuration(format!(
                "search.evalue must be positive, got {}",
                self.search.evalue
            )));
        }
        parse_delimiter(&self.classifier.delimiter)?;
        if let Some(delimiter) = &self.annotation.metadata_delimiter {
            parse_delimiter(delimiter)?;
        }
        if self.classifier.command.trim().is_empty() {
            return Err(AmpscanError::Configuration(
                "classifier.command is empty".to_string(),
            ));
        }
        if self.search.program.trim().is_empty() {
            return Err(AmpscanError::Configuration("search.program is empty".to_string()));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, AmpscanError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| AmpscanError::Configuration(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), AmpscanError> {
    std::fs::write(path, config.to_toml()?)?;
    Ok(())
}
