//! CLI for headfetch.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use headfetch_core::{config, logging};
use std::path::PathBuf;

use commands::{run_digest, run_pipeline, run_probe, RunOverrides};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "headfetch")]
#[command(about = "Fetch head content concurrently and report SHA-256 digests", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/headfetch/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log to ~/.local/state/headfetch/headfetch.log instead of stderr.
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the head content with N concurrent tasks, log digests, remove the working dir.
    Run {
        /// Resource URL (overrides config).
        #[arg(long)]
        url: Option<String>,
        /// Working directory (overrides config).
        #[arg(long, value_name = "DIR")]
        work_dir: Option<PathBuf>,
        /// Number of concurrent fetch tasks (overrides config).
        #[arg(long, value_name = "N")]
        tasks: Option<usize>,
        /// Body chunk size in bytes (overrides config).
        #[arg(long, value_name = "BYTES")]
        chunk_size: Option<usize>,
        /// Report digests sorted by file name instead of directory order.
        #[arg(long)]
        sorted: bool,
        /// Remove the working directory even when the run fails.
        #[arg(long)]
        always_cleanup: bool,
    },

    /// Send the metadata probe only and show whether a fetch would be skipped.
    Probe {
        /// Resource URL.
        url: String,
    },

    /// Print SHA-256 digest records for a directory (or a single file).
    Digest {
        /// Directory or file path.
        path: PathBuf,
        /// Sort records by file name.
        #[arg(long)]
        sorted: bool,
    },
}

impl Cli {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        init_logging(cli.log_file);

        match cli.command {
            CliCommand::Run {
                url,
                work_dir,
                tasks,
                chunk_size,
                sorted,
                always_cleanup,
            } => {
                let mut cfg = match &cli.config {
                    Some(path) => config::load_from(path)?,
                    None => config::load_or_init()?,
                };
                tracing::debug!("loaded config: {:?}", cfg);
                RunOverrides {
                    url,
                    work_dir,
                    tasks,
                    chunk_size,
                    sorted,
                    always_cleanup,
                }
                .apply(&mut cfg);
                run_pipeline(&cfg).await?;
            }
            CliCommand::Probe { url } => run_probe(&url).await?,
            CliCommand::Digest { path, sorted } => run_digest(&path, sorted).await?,
        }

        Ok(())
    }
}

fn init_logging(to_file: bool) {
    if !to_file {
        logging::init_logging_stderr();
        return;
    }
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }
}

#[cfg(test)]
mod tests;
