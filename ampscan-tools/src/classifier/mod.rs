//! Classifier adapter: batching, validation and caching around a [`Scorer`]

mod cache;
mod command;

pub use cache::ScoreCache;
pub use command::CommandScorer;

use crate::traits::Scorer;
use ampscan_bio::SequenceRecord;
use ampscan_core::error::{AmpscanError, AmpscanResult, Stage};
use ampscan_core::PredictionRecord;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

/// Scores sequences one-to-one and in input order
pub struct ClassifierAdapter<S: Scorer> {
    scorer: S,
    cache: Option<ScoreCache>,
    batch_size: usize,
    show_progress: bool,
}

impl<S: Scorer> ClassifierAdapter<S> {
    pub fn new(scorer: S) -> Self {
        let batch_size = scorer.recommended_batch_size().max(1);
        Self {
            scorer,
            cache: None,
            batch_size,
            show_progress: false,
        }
    }

    pub fn with_cache(mut self, cache: ScoreCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn cache(&self) -> Option<&ScoreCache> {
        self.cache.as_ref()
    }

    /// Score every sequence.
    ///
    /// Batches are scored in parallel and reassembled by index. A cached
    /// result is returned instead when one exists for exactly this input
    /// set and scorer.
    pub fn score(&self, sequences: &[SequenceRecord]) -> AmpscanResult<Vec<PredictionRecord>> {
        if sequences.is_empty() {
            return Ok(Vec::new());
        }

        let identity = self.scorer.identity();
        let key = ScoreCache::key(&identity, sequences);

        if let Some(cache) = &self.cache {
            if let Some(records) = cache.load(&key, sequences) {
                tracing::info!(
                    "Using cached scores for {} sequences ({})",
                    records.len(),
                    key
                );
                return Ok(records);
            }
            tracing::debug!("No valid cached scores for {}", key);
        }

        if !self.scorer.is_available() {
            return Err(AmpscanError::ScorerUnavailable(format!(
                "scorer '{}' cannot be invoked",
                identity
            )));
        }

        let batches = sequences.len().div_ceil(self.batch_size);
        tracing::info!(
            "Scoring {} sequences in {} batch(es) with {}",
            sequences.len(),
            batches,
            identity
        );

        let pb = self.progress_bar(batches as u64);
        let scores: Vec<Vec<f64>> = sequences
            .par_chunks(self.batch_size)
            .map(|batch| {
                let probabilities = self.scorer.score_batch(batch)?;
                if probabilities.len() != batch.len() {
                    return Err(AmpscanError::malformed(
                        Stage::Classify,
                        format!(
                            "scorer returned {} scores for a batch of {} starting at '{}'",
                            probabilities.len(),
                            batch.len(),
                            batch[0].id()
                        ),
                    ));
                }
                pb.inc(1);
                Ok(probabilities)
            })
            .collect::<AmpscanResult<_>>()?;
        pb.finish_and_clear();

        let records = sequences
            .iter()
            .zip(scores.into_iter().flatten())
            .map(|(sequence, probability)| PredictionRecord::new(sequence.id(), probability))
            .collect::<AmpscanResult<Vec<_>>>()?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(&key, &identity, &records) {
                tracing::warn!("Failed to cache scores in {}: {}", cache.dir().display(), e);
            }
        }

        Ok(records)
    }

    fn progress_bar(&self, batches: u64) -> ProgressBar {
        if !self.show_progress || batches < 2 {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(batches);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} batches ({eta})")
        {
            pb.set_style(style.progress_chars("##-"));
        }
        pb
    }
}
