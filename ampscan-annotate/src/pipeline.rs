//! End-to-end annotation run
//!
//! Stages run strictly in order: ingest, classify, filter, search, annotate,
//! summarize. Each returns owned output to the next; a failure is reported
//! with the stage it happened in.

use crate::engine::{AnnotatedRecord, AnnotationEngine};
use crate::report::{homolog_summary, CountSummary};
use ampscan_bio::{read_fasta, ReferenceTable, SequenceRecord};
use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use ampscan_core::PredictionRecord;
use ampscan_tools::{ClassifierAdapter, HomologySearch, Scorer};
use std::path::Path;
use std::time::Instant;

/// Everything a run reads
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub sequences: Vec<SequenceRecord>,
    pub reference: Vec<SequenceRecord>,
    pub metadata: ReferenceTable,
}

impl PipelineInput {
    /// Ingest stage: load both FASTA files and the metadata table
    pub fn load(
        sequences: &Path,
        reference: &Path,
        metadata: &Path,
        accession_column: &str,
        metadata_delimiter: Option<u8>,
    ) -> AmpscanResult<Self> {
        let sequences = read_fasta(sequences).map_err(|e| e.at_stage(Stage::Ingest))?;
        let reference = read_fasta(reference).map_err(|e| e.at_stage(Stage::Ingest))?;
        let metadata = ReferenceTable::read(metadata, accession_column, metadata_delimiter)
            .map_err(|e| e.at_stage(Stage::Metadata))?;

        tracing::info!(
            "Loaded {} query sequences, {} reference sequences, {} metadata rows",
            sequences.len(),
            reference.len(),
            metadata.len()
        );
        Ok(Self {
            sequences,
            reference,
            metadata,
        })
    }
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Every score, passing or not, in input order
    pub predictions: Vec<PredictionRecord>,
    /// Sequences whose prediction passed the threshold
    pub passing: Vec<SequenceRecord>,
    pub records: Vec<AnnotatedRecord>,
    pub summary: CountSummary<bool>,
}

pub struct Pipeline<S: Scorer, H: HomologySearch> {
    classifier: ClassifierAdapter<S>,
    searcher: H,
    engine: AnnotationEngine,
}

impl<S: Scorer, H: HomologySearch> Pipeline<S, H> {
    pub fn new(classifier: ClassifierAdapter<S>, searcher: H, engine: AnnotationEngine) -> Self {
        Self {
            classifier,
            searcher,
            engine,
        }
    }

    pub fn engine(&self) -> &AnnotationEngine {
        &self.engine
    }

    pub fn searcher(&self) -> &H {
        &self.searcher
    }

    pub fn run(&mut self, input: PipelineInput) -> AmpscanResult<PipelineOutput> {
        let start = Instant::now();
        let PipelineInput {
            sequences,
            reference,
            metadata,
        } = input;

        let predictions = self
            .classifier
            .score(&sequences)
            .map_err(|e| e.at_stage(Stage::Classify))?;
        if predictions.len() != sequences.len() {
            return Err(AmpscanError::malformed(
                Stage::Classify,
                format!(
                    "{} predictions for {} sequences",
                    predictions.len(),
                    sequences.len()
                ),
            ));
        }

        let threshold = self.engine.threshold();
        let passing: Vec<SequenceRecord> = sequences
            .into_iter()
            .zip(&predictions)
            .filter(|(_, prediction)| prediction.passes(threshold))
            .map(|(sequence, _)| sequence)
            .collect();
        tracing::info!(
            "{} of {} sequences score above {}",
            passing.len(),
            predictions.len(),
            threshold
        );

        let hits = if passing.is_empty() {
            tracing::info!("No sequences passed the threshold; skipping homology search");
            Vec::new()
        } else {
            self.searcher
                .search(&passing, &reference)
                .map_err(|e| e.at_stage(Stage::Search))?
        };

        let records = self.engine.annotate(&predictions, &hits, &metadata);
        let summary = homolog_summary(&records);

        tracing::info!(
            "Annotated {} records in {:.2}s",
            records.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(PipelineOutput {
            predictions,
            passing,
            records,
            summary,
        })
    }
}
