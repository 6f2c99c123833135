pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ampscan",
    version,
    about = "Annotate peptide sequences with AMP probabilities and homology",
    long_about = "ampscan scores sequences with an external antimicrobial-peptide classifier, \
                  searches those above a probability threshold against a reference set, and \
                  joins the best hit for each to a reference metadata table."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Number of threads to use (0 = all available)
    #[arg(short = 'j', long, default_value = "0", global = true)]
    pub threads: usize,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score, search and annotate a FASTA file
    Annotate(commands::annotate::AnnotateArgs),

    /// Create or inspect configuration files
    Config(commands::config::ConfigArgs),
}
