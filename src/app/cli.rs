//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Input Replay - Record desktop input and replay it as a script
#[derive(Parser, Debug)]
#[command(name = "input-replay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record input events and synthesize a replay script
    Record {
        /// Recording duration in seconds (0 = until Ctrl-C)
        #[arg(short, long, default_value = "0")]
        duration: u64,

        /// Output file name (without extension; timestamped if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Replay the recording immediately after capture stops
        #[arg(short, long)]
        execute: bool,
    },

    /// Replay a previously exported instruction file (JSON)
    Replay {
        /// Input instruction file
        input: PathBuf,

        /// Print the injections instead of performing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Initialize configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the directory exported scripts are written to
    pub fn scripts_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".input_replay").join("scripts"))
            .unwrap_or_else(|| PathBuf::from("scripts"))
    }
}
