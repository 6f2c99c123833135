use ampscan_annotate::{write_records, write_summary, AnnotationEngine, Pipeline, PipelineInput};
use ampscan_core::error::Stage;
use ampscan_core::{AmpscanError, OutputFormat};
use ampscan_tools::testing::hit;
use ampscan_tools::{ClassifierAdapter, MockScorer, MockSearcher, ScoreCache};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("queries.fasta"),
            ">P1 Neutrophil defensin OS=Homo sapiens\nACYCRIPACIAGERRY\nGTCIYQGRLWAFCC\n>P2 desc\nKVFGRCELAAAMKRHG\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("reference.fasta"),
            ">M1\nACYCRIPACIAGERRYGTCIYQGRLWAFCC\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("metadata.tsv"),
            "accession\tfamily\torganism\nM1\tdefensin\tHomo sapiens\nM1\tduplicate\tnone\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn input(&self) -> PipelineInput {
        PipelineInput::load(
            &self.path("queries.fasta"),
            &self.path("reference.fasta"),
            &self.path("metadata.tsv"),
            "accession",
            None,
        )
        .unwrap()
    }
}

#[test]
fn test_pipeline_from_files() {
    let fixture = Fixture::new();
    let input = fixture.input();
    assert_eq!(input.metadata.duplicates(), 1);
    let columns = input.metadata.columns().to_vec();

    let classifier = ClassifierAdapter::new(MockScorer::new(0.5).with_score("P1", 0.9))
        .with_cache(ScoreCache::new(fixture.path("cache")).unwrap());
    let mut pipeline = Pipeline::new(
        classifier,
        MockSearcher::new(vec![hit("P1", "M1", 1e-6, 55.0)]),
        AnnotationEngine::new(0.8).unwrap(),
    );
    let output = pipeline.run(input).unwrap();

    assert_eq!(output.records.len(), 1);
    assert_eq!(output.records[0].attribute("family"), Some("defensin"));

    let table = fixture.path("annotated.tsv");
    write_records(&table, OutputFormat::Tsv, &output.records, &columns, "OS=").unwrap();
    let text = fs::read_to_string(&table).unwrap();
    let row: Vec<&str> = text.lines().nth(1).unwrap().split('\t').collect();
    assert_eq!(row[2], "Neutrophil defensin");
    assert_eq!(&row[11..], &["defensin", "Homo sapiens"]);

    let mut summary = Vec::new();
    write_summary(&mut summary, "has_homolog", &output.summary).unwrap();
    assert_eq!(String::from_utf8(summary).unwrap(), "has_homolog\tcount\ntrue\t1\n");
}

#[test]
fn test_malformed_query_file_reports_ingest_stage() {
    let fixture = Fixture::new();
    fs::write(fixture.path("queries.fasta"), ">P1\n>P2\nGIGK\n").unwrap();

    let err = PipelineInput::load(
        &fixture.path("queries.fasta"),
        &fixture.path("reference.fasta"),
        &fixture.path("metadata.tsv"),
        "accession",
        None,
    )
    .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::Ingest));
}

#[test]
fn test_missing_metadata_file_reports_metadata_stage() {
    let fixture = Fixture::new();
    let err = PipelineInput::load(
        &fixture.path("queries.fasta"),
        &fixture.path("reference.fasta"),
        &fixture.path("absent.tsv"),
        "accession",
        None,
    )
    .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Metadata));
    assert!(matches!(err.root_cause(), AmpscanError::Io(_)));
}
