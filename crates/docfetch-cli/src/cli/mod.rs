//! CLI for the docfetch batch downloader.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use docfetch_core::config::{self, DocfetchConfig};
use std::path::PathBuf;

use commands::{run_batch, run_config_path, run_plan};

/// Top-level CLI for docfetch.
#[derive(Debug, Parser)]
#[command(name = "docfetch")]
#[command(about = "docfetch: bounded-concurrency batch document downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the next batch of missing documents, then write the status report and merged metadata.
    Run(RunArgs),

    /// Show which entries the next run would fetch, without downloading anything.
    Plan(RunArgs),

    /// Print the path of the config file.
    ConfigPath,
}

/// Overrides applied on top of config.toml.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Read configuration from this file instead of the default location.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum entries fetched this run.
    #[arg(long, value_name = "N")]
    pub batch_cap: Option<usize>,

    /// Maximum simultaneous downloads.
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Input dataset (CSV).
    #[arg(long, value_name = "FILE")]
    pub dataset: Option<PathBuf>,

    /// Master metadata store (CSV).
    #[arg(long, value_name = "FILE")]
    pub metadata: Option<PathBuf>,

    /// Destination directory for downloaded documents.
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Output directory for the status report and merged metadata.
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

impl RunArgs {
    /// Loads the config (explicit file or default location) and applies the overrides.
    pub fn load_config(&self) -> Result<DocfetchConfig> {
        let cfg = match &self.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        Ok(self.apply(cfg))
    }

    pub fn apply(&self, mut cfg: DocfetchConfig) -> DocfetchConfig {
        if let Some(n) = self.batch_cap {
            cfg.batch_cap = n;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency_limit = n;
        }
        if let Some(p) = &self.dataset {
            cfg.dataset_path = p.clone();
        }
        if let Some(p) = &self.metadata {
            cfg.metadata_path = p.clone();
        }
        if let Some(p) = &self.dest {
            cfg.destination_dir = p.clone();
        }
        if let Some(p) = &self.output {
            cfg.output_dir = p.clone();
        }
        cfg
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Run(args) => {
                let cfg = args.load_config()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_batch(&cfg).await?;
            }
            CliCommand::Plan(args) => {
                let cfg = args.load_config()?;
                tracing::debug!("loaded config: {:?}", cfg);
                run_plan(&cfg)?;
            }
            CliCommand::ConfigPath => run_config_path()?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
