/// Integration tests for configuration loading and saving
use ampscan_core::config::{default_config, load_config, save_config, MetadataKey};
use ampscan_core::{AmpscanError, OutputFormat};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_project_config_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ampscan.toml");

    let content = r#"
[classifier]
command = "/opt/amp/bin/score"
args = ["--fasta", "{input}", "--out", "{output}"]
id_column = "SeqID"
probability_column = "Prediction_Probability"
delimiter = ","
cache_dir = "/var/cache/ampscan"

[search]
threads = 8
batch_size = 250

[annotation]
threshold = 0.5
accession_column = "Entry"
metadata_delimiter = "tab"

[output]
format = "json"
description_marker = "GN="
"#;
    fs::write(&path, content).unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.classifier.command, "/opt/amp/bin/score");
    assert_eq!(config.classifier.args[1], "{input}");
    assert_eq!(config.classifier.id_column, "SeqID");
    assert_eq!(config.classifier.delimiter, ",");
    assert_eq!(
        config.classifier.cache_dir.as_deref(),
        Some(std::path::Path::new("/var/cache/ampscan"))
    );
    assert_eq!(config.search.threads, 8);
    assert_eq!(config.search.batch_size, 250);
    assert_eq!(config.search.program, "blastp");
    assert_eq!(config.threshold().unwrap(), 0.5);
    assert_eq!(config.annotation.accession_column, "Entry");
    assert_eq!(config.annotation.metadata_key, MetadataKey::SubjectTitle);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert_eq!(config.output.description_marker, "GN=");
}

#[test]
fn test_unknown_enum_value_is_configuration_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ampscan.toml");
    fs::write(&path, "[annotation]\nmetadata_key = \"family\"\n").unwrap();

    assert!(matches!(load_config(&path), Err(AmpscanError::Configuration(_))));
}

#[test]
fn test_bad_delimiter_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ampscan.toml");
    fs::write(&path, "[classifier]\ndelimiter = \"::\"\n").unwrap();

    assert!(matches!(load_config(&path), Err(AmpscanError::Configuration(_))));
}

#[test]
fn test_saved_default_config_reloads() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested.toml");

    save_config(&path, &default_config()).unwrap();
    let reloaded = load_config(&path).unwrap();

    assert!(reloaded.annotation.threshold.is_none());
    assert_eq!(reloaded.search.max_target_seqs, 500);
    assert_eq!(reloaded.classifier.batch_size, 5000);
}
