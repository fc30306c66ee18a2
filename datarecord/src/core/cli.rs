use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{APP_NAME_LOWER, ENV_CONFIG, ENV_DATABASE, ENV_MAX_SCAN_ROWS};

#[derive(Parser, Debug)]
#[command(name = APP_NAME_LOWER)]
#[command(version, about = "Datarecord filter engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// DuckDB database file (in-memory when unset)
    #[arg(long, global = true, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,

    /// Maximum rows scanned by one post-filtered query (0 = unbounded)
    #[arg(long, global = true, env = ENV_MAX_SCAN_ROWS)]
    pub max_scan_rows: Option<usize>,
}

#[derive(Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Create tables for all configured classes
    Init,
    /// Execute a filter and print matching records as JSON lines
    Query {
        /// Filter definition as JSON
        #[arg(long, short = 'f')]
        filter: String,
        /// Override the filter's result limit
        #[arg(long)]
        limit: Option<usize>,
        /// Override the filter's result start
        #[arg(long)]
        start: Option<usize>,
    },
    /// Print the SELECT compiled for a filter
    Sql {
        #[arg(long, short = 'f')]
        filter: String,
    },
    /// Validate a filter and list every problem found
    Validate {
        #[arg(long, short = 'f')]
        filter: String,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub max_scan_rows: Option<usize>,
}

impl Cli {
    /// Split parsed arguments into config overrides and the command
    pub fn into_parts(self) -> (CliConfig, Commands) {
        let config = CliConfig {
            config: self.config,
            database: self.database,
            max_scan_rows: self.max_scan_rows,
        };
        (config, self.command)
    }
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    Cli::parse().into_parts()
}
