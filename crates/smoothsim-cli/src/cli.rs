//! CLI argument definitions.

use clap::{Parser, Subcommand, ValueEnum};

use crate::commands::{IncomeArgs, PolicyArgs, SolveArgs};

/// Smoothsim - Steady state of an income-fluctuation savings problem
#[derive(Parser)]
#[command(name = "smoothsim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Log solver progress (debug level) to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Solve for the steady state and print aggregates by income state
    Solve(SolveArgs),

    /// Tabulate consumption and savings against cash-on-hand for one state
    Policy(PolicyArgs),

    /// Print the income levels and stationary probabilities of the chain
    Income(IncomeArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}
