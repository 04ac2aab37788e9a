//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use command::enrich::EnrichArgs;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask the site oracle for a point list and save it as CSV
    Suggest {
        /// Request unexplored candidate areas instead of documented sites
        #[arg(long)]
        candidates: bool,
        /// Model identifier passed to the oracle endpoint
        #[arg(long, default_value = "o3")]
        model: String,
    },
    /// Enrich a point-list CSV with all sensor features
    Enrich(EnrichArgs),
    /// Compare a benchmark table against a candidate table
    Compare {
        /// Enriched CSV of known reference sites
        benchmark: PathBuf,
        /// Enriched CSV of candidate sites
        candidates: PathBuf,
    },
    /// Ask the oracle which enriched candidates match the benchmarks
    Analyze {
        /// Enriched CSV of known reference sites
        benchmark: PathBuf,
        /// Enriched CSV of candidate sites
        candidates: PathBuf,
        /// Model identifier passed to the oracle endpoint
        #[arg(long, default_value = "o3")]
        model: String,
    },
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}
