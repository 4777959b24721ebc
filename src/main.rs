//! depage - report the creation date of every runtime dependency archive.

use std::io::IsTerminal;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use depage::app::AppContext;
use depage::cli::Cli;
use depage::cli::output::robot_error;
use depage::{DepageError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, cli.robot);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    depage::cli::commands::run(&ctx, &cli.command)
}

fn report_error(e: &DepageError, robot: bool) {
    if robot {
        // Robot mode: JSON error output to stdout
        let payload = serde_json::to_string(&robot_error(e)).unwrap_or_default();
        println!("{payload}");
    } else {
        let chain = e.chain();
        eprintln!("Error: {}", chain[0]);
        for cause in &chain[1..] {
            eprintln!("  caused by: {cause}");
        }
    }
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,depage=info",
        1 => "info,depage=debug",
        2 => "debug,depage=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(std::io::stderr().is_terminal()),
            )
            .init();
    }
}
