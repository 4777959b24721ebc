//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::resolve::descriptor::DEFAULT_DESCRIPTOR;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "depage", version, about = "Report the creation date of every runtime dependency")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project descriptor
    #[arg(long, global = true, env = "DEPAGE_PROJECT", default_value = DEFAULT_DESCRIPTOR)]
    pub project: PathBuf,

    /// Explicit config file (skips global and project config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Silence all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// JSON output on stdout, JSON logs on stderr
    #[arg(long, global = true)]
    pub robot: bool,
}
