//! Joins classifier predictions, homology hits and reference metadata
//!
//! The [`engine`] does the filtering and both left joins, [`report`] derives
//! counts from the joined records, [`pipeline`] runs every stage in order,
//! and [`output`] writes the results.

pub mod engine;
pub mod output;
pub mod pipeline;
pub mod report;

pub use engine::{AnnotatedRecord, AnnotationEngine};
pub use output::{write_json, write_records, write_summary, write_tsv, TSV_COLUMNS};
pub use pipeline::{Pipeline, PipelineInput, PipelineOutput};
pub use report::{count_by, describe, homolog_summary, CountSummary};
