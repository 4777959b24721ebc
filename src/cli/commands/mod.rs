//! CLI command implementations
//!
//! Each subcommand has its own module with an Args struct and a `run()`
//! function.

use clap::Subcommand;

pub mod inspect;
pub mod list;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report the creation date of every runtime dependency
    List(list::ListArgs),

    /// Show what each extraction tier sees in one archive
    Inspect(inspect::InspectArgs),
}

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::List(args) => list::run(ctx, args),
        Commands::Inspect(args) => inspect::run(ctx, args),
    }
}
