//! BLAST+ homology search

mod parser;

pub use parser::{format_hit_line, outfmt, parse_hit_line, parse_hits, read_hits, HIT_COLUMNS};

use crate::process::{resolve_binary, run_tool};
use crate::traits::HomologySearch;
use ampscan_bio::{fingerprint_records, write_fasta, SequenceRecord};
use ampscan_core::config::SearchConfig;
use ampscan_core::error::{AmpscanError, AmpscanResult};
use ampscan_core::HomologyHit;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const COMPLETE_MARKER: &str = ".complete";
const DB_NAME: &str = "reference";

/// Runs `makeblastdb` once per distinct database and the search program
/// once per query batch
pub struct BlastSearcher {
    program: String,
    index_builder: String,
    program_path: Option<PathBuf>,
    builder_path: Option<PathBuf>,
    db_type: String,
    evalue: f64,
    max_target_seqs: usize,
    threads: usize,
    batch_size: usize,
    work_dir: Option<PathBuf>,
    scratch: Option<TempDir>,
}

impl BlastSearcher {
    pub fn from_config(config: &SearchConfig) -> Self {
        let threads = if config.threads == 0 {
            num_cpus::get()
        } else {
            config.threads
        };

        Self {
            program: config.program.clone(),
            index_builder: config.index_builder.clone(),
            program_path: resolve_binary(&config.program),
            builder_path: resolve_binary(&config.index_builder),
            db_type: config.db_type.clone(),
            evalue: config.evalue,
            max_target_seqs: config.max_target_seqs,
            threads,
            batch_size: config.batch_size.max(1),
            work_dir: config.work_dir.clone(),
            scratch: None,
        }
    }

    /// Keep indexes under `dir` so later runs can reuse them
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    fn work_root(&mut self) -> AmpscanResult<PathBuf> {
        if let Some(dir) = &self.work_dir {
            fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }
        if self.scratch.is_none() {
            self.scratch = Some(tempfile::Builder::new().prefix("ampscan-search-").tempdir()?);
        }
        match &self.scratch {
            Some(scratch) => Ok(scratch.path().to_path_buf()),
            None => Err(AmpscanError::SearchUnavailable(
                "no working directory for the search".to_string(),
            )),
        }
    }

    fn unavailable(&self, tool: &str) -> AmpscanError {
        AmpscanError::SearchUnavailable(format!("'{}' not found", tool))
    }

    /// Build or reuse the index for `database`, returning its `-db` prefix.
    ///
    /// Indexes live in a directory named by the database fingerprint; one
    /// without the completion marker is treated as absent and rebuilt.
    pub fn ensure_index(&mut self, database: &[SequenceRecord]) -> AmpscanResult<PathBuf> {
        let builder = self
            .builder_path
            .clone()
            .ok_or_else(|| self.unavailable(&self.index_builder))?;

        let fingerprint = fingerprint_records(database);
        let index_dir = self
            .work_root()?
            .join(format!("db-{}", &fingerprint.to_hex()[..16]));
        let prefix = index_dir.join(DB_NAME);

        if index_dir.join(COMPLETE_MARKER).exists() {
            tracing::debug!("Reusing search index {}", index_dir.display());
            return Ok(prefix);
        }
        if index_dir.exists() {
            tracing::debug!("Discarding incomplete index {}", index_dir.display());
            fs::remove_dir_all(&index_dir)?;
        }
        fs::create_dir_all(&index_dir)?;

        let fasta = index_dir.join(format!("{}.fasta", DB_NAME));
        write_fasta(&fasta, database, 0)?;

        tracing::info!("Indexing {} reference sequences", database.len());
        let mut cmd = Command::new(&builder);
        cmd.arg("-in")
            .arg(&fasta)
            .arg("-dbtype")
            .arg(&self.db_type)
            .arg("-out")
            .arg(&prefix);
        run_tool(&mut cmd, &self.index_builder).map_err(AmpscanError::SearchUnavailable)?;

        fs::write(index_dir.join(COMPLETE_MARKER), fingerprint.to_hex())?;
        Ok(prefix)
    }

    fn search_batch(
        &self,
        program: &Path,
        batch: &[SequenceRecord],
        db_prefix: &Path,
        scratch: &Path,
        batch_idx: usize,
    ) -> AmpscanResult<Vec<HomologyHit>> {
        let query_path = scratch.join(format!("query-{}.fasta", batch_idx));
        let output_path = scratch.join(format!("hits-{}.tsv", batch_idx));
        write_fasta(&query_path, batch, 0)?;

        let mut cmd = Command::new(program);
        cmd.arg("-query")
            .arg(&query_path)
            .arg("-db")
            .arg(db_prefix)
            .arg("-out")
            .arg(&output_path)
            .arg("-outfmt")
            .arg(outfmt())
            .arg("-evalue")
            .arg(self.evalue.to_string())
            .arg("-max_target_seqs")
            .arg(self.max_target_seqs.to_string())
            .arg("-num_threads")
            .arg(self.threads.to_string());
        run_tool(&mut cmd, &self.program).map_err(AmpscanError::SearchUnavailable)?;

        if !output_path.exists() {
            return Err(AmpscanError::SearchUnavailable(format!(
                "{} wrote no output for batch {}",
                self.program, batch_idx
            )));
        }
        read_hits(&output_path)
    }
}

impl HomologySearch for BlastSearcher {
    fn search(
        &mut self,
        queries: &[SequenceRecord],
        database: &[SequenceRecord],
    ) -> AmpscanResult<Vec<HomologyHit>> {
        if queries.is_empty() || database.is_empty() {
            tracing::info!(
                "Nothing to search ({} queries, {} references)",
                queries.len(),
                database.len()
            );
            return Ok(Vec::new());
        }

        let program = self
            .program_path
            .clone()
            .ok_or_else(|| self.unavailable(&self.program))?;
        let db_prefix = self.ensure_index(database)?;
        let scratch = tempfile::Builder::new()
            .prefix("batches-")
            .tempdir_in(self.work_root()?)?;

        let batches = queries.len().div_ceil(self.batch_size);
        tracing::info!(
            "Searching {} queries in {} batch(es) with {} ({} threads)",
            queries.len(),
            batches,
            self.program,
            self.threads
        );

        let mut hits = Vec::new();
        for (idx, batch) in queries.chunks(self.batch_size).enumerate() {
            let batch_hits = self.search_batch(&program, batch, &db_prefix, scratch.path(), idx)?;
            tracing::debug!("Batch {}/{}: {} hits", idx + 1, batches, batch_hits.len());
            hits.extend(batch_hits);
        }

        tracing::info!("Search produced {} hits", hits.len());
        Ok(hits)
    }

    fn version(&self) -> AmpscanResult<String> {
        let program = self
            .program_path
            .as_ref()
            .ok_or_else(|| self.unavailable(&self.program))?;
        let mut cmd = Command::new(program);
        cmd.arg("-version");
        let output = run_tool(&mut cmd, &self.program).map_err(AmpscanError::SearchUnavailable)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string())
    }

    fn is_available(&self) -> bool {
        self.program_path.is_some() && self.builder_path.is_some()
    }
}
