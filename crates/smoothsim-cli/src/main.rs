//! Smoothsim CLI - Command-line interface for the household steady-state solver.
//!
//! # Usage
//!
//! ```bash
//! # Solve the benchmark calibration
//! smoothsim solve
//!
//! # Solve a calibration recipe with overrides, as JSON
//! smoothsim --format json solve --calibration model.toml --beta 0.96
//!
//! # Tabulate the consumption policy of income state 3
//! smoothsim policy --state 3 --points 25
//!
//! # Show the discretized income process
//! smoothsim income --income-states 7
//! ```

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod error;
mod output;
mod recipe;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let format = cli.format;

    match cli.command {
        Commands::Solve(args) => commands::solve::execute(args, format)?,
        Commands::Policy(args) => commands::policy::execute(args, format)?,
        Commands::Income(args) => commands::income::execute(args, format)?,
    }

    Ok(())
}

/// Logs go to stderr so that JSON and CSV output stay parseable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
