use crate::cli::output::{info, percent, section_header, success, tree_item, warning};
use ampscan_annotate::{
    write_records, write_summary, AnnotationEngine, Pipeline, PipelineInput, PipelineOutput,
};
use ampscan_bio::write_fasta;
use ampscan_core::config::{load_config, parse_delimiter, MetadataKey};
use ampscan_core::{Config, OutputFormat};
use ampscan_tools::{
    BlastSearcher, ClassifierAdapter, CommandScorer, HomologySearch, PrecomputedHits, ScoreCache,
};
use anyhow::Context;
use clap::Args;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct AnnotateArgs {
    /// Query sequences (FASTA, optionally gzip-compressed)
    #[arg(value_name = "FASTA")]
    pub input: PathBuf,

    /// Reference sequences to search against
    #[arg(short, long, value_name = "FASTA")]
    pub reference: PathBuf,

    /// Reference metadata table (CSV or TSV with a header row)
    #[arg(short, long, value_name = "FILE")]
    pub metadata: PathBuf,

    /// Annotated output table
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Probability a prediction must exceed (required here or in the config)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Configuration file
    #[arg(short, long, env = "AMPSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output table format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write homolog counts to this file
    #[arg(long, value_name = "FILE")]
    pub summary: Option<PathBuf>,

    /// Write the sequences above the threshold to this FASTA file
    #[arg(long, value_name = "FILE")]
    pub passing_fasta: Option<PathBuf>,

    /// Hit field joined against the metadata accession column
    #[arg(long, value_enum)]
    pub metadata_key: Option<MetadataKey>,

    /// Name of the accession column in the metadata table
    #[arg(long)]
    pub accession_column: Option<String>,

    /// Metadata delimiter (default: inferred from the file extension)
    #[arg(long)]
    pub metadata_delimiter: Option<String>,

    /// Use an existing 15-column hit table instead of running the search
    #[arg(long, value_name = "FILE")]
    pub hits: Option<PathBuf>,

    /// Scorer executable
    #[arg(long)]
    pub scorer: Option<String>,

    /// Directory for cached classifier scores
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// E-value cutoff passed to the search program
    #[arg(long)]
    pub evalue: Option<f64>,

    /// Directory for search indexes (reused across runs)
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Hide the scoring progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Config file values with command-line flags layered on top
pub fn resolve_config(args: &AnnotateArgs) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(threshold) = args.threshold {
        config.annotation.threshold = Some(threshold);
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(key) = args.metadata_key {
        config.annotation.metadata_key = key;
    }
    if let Some(column) = &args.accession_column {
        config.annotation.accession_column = column.clone();
    }
    if let Some(delimiter) = &args.metadata_delimiter {
        config.annotation.metadata_delimiter = Some(delimiter.clone());
    }
    if let Some(scorer) = &args.scorer {
        config.classifier.command = scorer.clone();
    }
    if let Some(dir) = &args.cache_dir {
        config.classifier.cache_dir = Some(dir.clone());
    }
    if let Some(evalue) = args.evalue {
        config.search.evalue = evalue;
    }
    if let Some(dir) = &args.work_dir {
        config.search.work_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

pub fn run(args: AnnotateArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    tracing::debug!("Resolved configuration: {:?}", config);
    let threshold = config.threshold()?;
    let metadata_delimiter = config
        .annotation
        .metadata_delimiter
        .as_deref()
        .map(parse_delimiter)
        .transpose()?;

    let input = PipelineInput::load(
        &args.input,
        &args.reference,
        &args.metadata,
        &config.annotation.accession_column,
        metadata_delimiter,
    )?;
    let metadata_columns = input.metadata.columns().to_vec();
    let duplicate_accessions = input.metadata.duplicates();

    let mut classifier = ClassifierAdapter::new(CommandScorer::from_config(&config.classifier)?)
        .with_progress(!args.no_progress);
    if let Some(dir) = &config.classifier.cache_dir {
        classifier = classifier.with_cache(ScoreCache::new(dir)?);
    }

    let searcher: Box<dyn HomologySearch> = match &args.hits {
        Some(path) => Box::new(PrecomputedHits::from_file(path)?),
        None => Box::new(BlastSearcher::from_config(&config.search)),
    };
    let engine =
        AnnotationEngine::new(threshold)?.with_metadata_key(config.annotation.metadata_key);

    let output = Pipeline::new(classifier, searcher, engine).run(input)?;

    write_records(
        &args.output,
        config.output.format,
        &output.records,
        &metadata_columns,
        &config.output.description_marker,
    )?;
    if let Some(path) = &args.summary {
        let writer = BufWriter::new(File::create(path)?);
        write_summary(writer, "has_homolog", &output.summary)?;
    }
    if let Some(path) = &args.passing_fasta {
        write_fasta(path, &output.passing, config.output.fasta_line_width)?;
    }

    print_report(&output, threshold, &args.output);
    if duplicate_accessions > 0 {
        warning(&format!(
            "{} metadata rows repeated an accession and were ignored",
            duplicate_accessions
        ));
    }
    Ok(())
}

fn print_report(output: &PipelineOutput, threshold: f64, path: &Path) {
    let scored = output.predictions.len();
    let passing = output.records.len();
    let with_homolog = output.summary.get(&true);
    let with_metadata = output
        .records
        .iter()
        .filter(|r| !r.attributes().is_empty())
        .count();

    section_header("Annotation summary");
    tree_item(false, "Sequences scored", Some(&scored.to_string()));
    tree_item(
        false,
        &format!("Above {}", threshold),
        Some(&format!("{} ({:.1}%)", passing, percent(passing, scored))),
    );
    tree_item(
        false,
        "With homolog",
        Some(&format!("{} ({:.1}%)", with_homolog, percent(with_homolog, passing))),
    );
    tree_item(true, "With metadata", Some(&with_metadata.to_string()));

    if passing == 0 {
        info("No sequence passed the threshold; the table has a header only");
    }
    success(&format!("Wrote {} records to {}", passing, path.display()));
}
