use crate::cli::output::success;
use ampscan_core::config::{default_config, load_config, save_config};
use anyhow::Context;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a configuration file with every default filled in
    Init {
        #[arg(default_value = "ampscan.toml")]
        path: PathBuf,

        /// Threshold to record in the file
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show {
        #[arg(env = "AMPSCAN_CONFIG")]
        path: Option<PathBuf>,
    },
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Init {
            path,
            threshold,
            force,
        } => {
            if path.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
            }
            let mut config = default_config();
            config.annotation.threshold = threshold;
            config.validate()?;
            save_config(&path, &config)?;
            success(&format!("Wrote {}", path.display()));
        }
        ConfigCommands::Show { path } => {
            let config = match &path {
                Some(path) => load_config(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => default_config(),
            };
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
