//! Command-line interface for the quaestor-server binary.
//!
//! Uses clap for argument parsing and owo-colors for the startup banner.

pub mod output;

use clap::Parser;
use std::path::PathBuf;

/// Quaestor - autonomous research agent server.
#[derive(Parser, Debug)]
#[command(
    name = "quaestor-server",
    version,
    about = "Quaestor - autonomous research agent server",
    long_about = "An autonomous research agent server: decomposes a query into sub-questions,\n\
                  runs a bounded tool pipeline (search, scrape, analyze, summarize), and\n\
                  synthesizes a cited Markdown report.",
    after_help = "EXAMPLES:\n    \
                  quaestor-server                       # Start with .env configuration\n    \
                  quaestor-server --port 9000           # Override the listen port\n    \
                  quaestor-server --env-file prod.env   # Load a specific env file"
)]
pub struct Cli {
    /// Host address to bind (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to an env file loaded before configuration
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// Enable verbose (debug-level) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
