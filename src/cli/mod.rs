//! CLI module for juris
//!
//! Provides command-line interface parsing for the juris binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// juris - autonomous multi-round legal research
///
/// Plans search queries, gathers and scores evidence over several rounds,
/// and decides on its own when the evidence is sufficient.
#[derive(Parser, Debug)]
#[command(
    name = "juris",
    author = "Juris Lab <dev@juris-lab.co>",
    version,
    about = "juris - autonomous multi-round legal research",
    long_about = "Researches a legal question over several search rounds, scoring the evidence\n\
                  after each round and stopping when it is sufficient or a safety cap is reached.",
    after_help = "EXAMPLES:\n    \
                  juris init                                   # Write a default juris.toml\n    \
                  juris research \"requisitos para usucapion\"   # Research with the configured model\n    \
                  juris research --offline \"...\"               # Rule-based policy, no model\n    \
                  juris research --json \"...\" > out.json       # Machine-readable result\n    \
                  juris config --validate                      # Check juris.toml"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "juris.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a legal question
    Research {
        /// The question to research
        question: String,

        /// Maximum number of rounds
        #[arg(long)]
        max_rounds: Option<usize>,

        /// Maximum searches per round
        #[arg(long)]
        max_searches: Option<usize>,

        /// Per-search timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Use the rule-based decision policy instead of a language model
        #[arg(long)]
        offline: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default juris.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (ollama or openai)
        #[arg(long, default_value = "ollama", value_parser = ["ollama", "openai"])]
        provider: String,

        /// Search backend to configure (duckduckgo or serper)
        #[arg(long, default_value = "duckduckgo", value_parser = ["duckduckgo", "serper"])]
        search: String,
    },

    /// Show configuration information
    Config {
        /// Print the effective configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
