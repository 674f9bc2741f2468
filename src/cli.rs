// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::definitions::builtins::WIREFRAME_BLOB;

#[derive(Parser, Debug, Clone)]
#[command(name = "aster")]
#[command(about = "Aster Competition live-coding harness", long_about = None)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding clips, submissions and the vote flag
    #[arg(long = "data-dir", global = true, default_value = "aster-data")]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Open the live preview; Enter submits, Esc quits
    Run {
        /// Definition source file (built-in name or JSON recipe), reloaded on change
        #[arg(long)]
        source: Option<PathBuf>,

        /// Built-in definition used when no source file is given
        #[arg(long, default_value = WIREFRAME_BLOB)]
        builtin: String,

        /// Author name recorded with a submission
        #[arg(long)]
        author: Option<String>,
    },

    /// List submissions, most votes first
    Gallery,

    /// Cast this client's vote for a submission
    Vote {
        /// Author of the submission
        user: String,
    },
}
