//! CLI command definitions and parsing
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "flowmap",
    version,
    author = "neur0map",
    about = "Process maps and case-duration analytics over tabular event logs",
    long_about = "Flowmap reads event logs from a data directory, applies an ordered list of \
                  filters, and prints directly-follows process maps, case duration \
                  distributions and log summaries as JSON."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/flowmap/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the data directory log files are read from
    #[arg(short, long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where an analysis request comes from
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// JSON request file with `file`, `filters`, `controls` and `workhours`
    #[arg(short, long, value_name = "FILE", conflicts_with = "file")]
    pub request: Option<PathBuf>,

    /// Log file name inside the data directory (no filters)
    #[arg(short, long, required_unless_present = "request")]
    pub file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Analysis(AnalysisCommand),

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Commands that read logs from the data directory
#[derive(Subcommand, Debug)]
pub enum AnalysisCommand {
    /// Build the directly-follows process map
    Map {
        #[command(flatten)]
        request: RequestArgs,

        /// Drop edges seen fewer times than this (overrides request and config)
        #[arg(short, long)]
        min_edge_occurrences: Option<u64>,
    },

    /// Case duration histogram and density line
    Durations {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Start and end activities with case counts
    Endpoints {
        /// Log file name inside the data directory
        file: String,
    },

    /// Columns available for filtering
    Columns {
        /// Log file name inside the data directory
        file: String,
    },

    /// Distinct values of one column
    Values {
        /// Log file name inside the data directory
        file: String,

        /// Column name after renaming
        column: String,
    },

    /// Distinct activity sequences, most frequent first
    Variants {
        /// Log file name inside the data directory
        file: String,
    },

    /// List log files in the data directory
    Files,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
