#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const QUERIES: &str = "\
>P1 Neutrophil defensin 1 OS=Homo sapiens
ACYCRIPACIAGERRYGTCIYQGRLWAFCC
>P2 Lysozyme C OS=Gallus gallus
KVFGRCELAAAMKRHGLDNYRGYSLGNWVCAAKFESNFNTQATNRNTDGSTDYGILQINSRWWCNDGRTP
>P3 Magainin-2 OS=Xenopus laevis
GIGKFLHSAKKFGKAFVGEIMNS
";

pub const REFERENCE: &str = "\
>M1
ACYCRIPACIAGERRYGTCIYQGRLWAFCC
>M2
GIGKFLHSAKKFGKAFVGEIMNS
";

/// Scores every sequence starting with `K` at 0.1 and the rest at 0.9
pub const FAKE_SCORER: &str = r#"#!/bin/sh
while [ "$#" -gt 0 ]; do
    case "$1" in
        -i) shift; in="$1" ;;
        -o) shift; out="$1" ;;
    esac
    shift
done
printf 'seq_id\tprobability\n' > "$out"
awk '/^>/ { id = substr($0, 2); next } { p = ($0 ~ /^K/) ? 0.1 : 0.9; print id "\t" p }' "$in" >> "$out"
"#;

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    pub fn create_input_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    /// Standard query, reference and metadata files
    pub fn with_inputs(self) -> Self {
        self.create_input_file("queries.fasta", QUERIES);
        self.create_input_file("reference.fasta", REFERENCE);
        self.create_input_file(
            "metadata.tsv",
            "accession\tfamily\tsource\nM1\tdefensin\tneutrophil\nM2\tmagainin\tskin\n",
        );
        self
    }

    #[cfg(unix)]
    pub fn install_script(&self, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.create_input_file(name, script);
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// `annotate` with the standard inputs and no extra flags
    pub fn annotate(&self) -> Command {
        let mut cmd = ampscan_cmd();
        cmd.arg("annotate")
            .arg(self.path("queries.fasta"))
            .arg("--reference")
            .arg(self.path("reference.fasta"))
            .arg("--metadata")
            .arg(self.path("metadata.tsv"))
            .arg("--output")
            .arg(self.path("annotated.tsv"))
            .arg("--no-progress");
        cmd
    }
}

/// Helper to run the ampscan CLI
pub fn ampscan_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ampscan").unwrap();
    cmd.env_remove("AMPSCAN_CONFIG");
    cmd
}

pub fn hit_row(query: &str, subject: &str, evalue: &str) -> String {
    format!("{query}\t{subject}\t95.0\t23\t{evalue}\t48.1\t1\t0\t1\t23\t1\t23\tN/A\t0\t{subject}\n")
}

pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}
