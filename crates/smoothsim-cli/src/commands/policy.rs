//! Policy command implementation.
//!
//! Tabulates the consumption policy of one income state.

use anyhow::Result;
use clap::Args;
use ndarray::Array1;
use serde::Serialize;
use tabled::Tabled;

use smoothsim_household::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::{validate_state, RecipeArgs};
use crate::error::CliError;
use crate::output::{fixed, print_header, print_output};

/// Arguments for the policy command.
#[derive(Args, Debug)]
pub struct PolicyArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Income state to tabulate
    #[arg(short, long)]
    pub state: usize,

    /// Number of cash-on-hand points
    #[arg(short = 'n', long, default_value = "20")]
    pub points: usize,

    /// Largest cash-on-hand to show. Defaults to the constraint threshold plus 10.
    #[arg(long)]
    pub max_coh: Option<f64>,
}

/// Policy at one level of cash-on-hand.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct PolicyRow {
    #[tabled(rename = "Cash-on-hand", display_with = "fixed")]
    pub cash_on_hand: f64,
    #[tabled(rename = "Consumption", display_with = "fixed")]
    pub consumption: f64,
    #[tabled(rename = "Savings", display_with = "fixed")]
    pub savings: f64,
    #[tabled(rename = "MPC", display_with = "fixed")]
    pub mpc: f64,
}

/// Execute the policy command.
pub fn execute(args: PolicyArgs, format: OutputFormat) -> Result<()> {
    let recipe = args.recipe.recipe()?;
    let calibration = recipe.build()?;
    let state = validate_state(args.state, calibration.n_states())?;
    if args.points < 2 {
        return Err(CliError::InvalidArgument("--points must be at least 2".into()).into());
    }

    let ss = steady_state(&calibration, &recipe.solver)?;
    let policy = ss.policy.state(state);
    let threshold = policy.constraint_threshold();

    // Start inside the constrained region so the kink is visible.
    let lo = 0.5 * threshold;
    let hi = args.max_coh.unwrap_or(threshold + 10.0);
    if hi <= lo {
        return Err(CliError::InvalidArgument(format!(
            "--max-coh must exceed {lo:.6} for state {state}"
        ))
        .into());
    }

    let coh = Array1::linspace(lo, hi, args.points).to_vec();
    let consumption = policy.consumption_schedule(&coh);
    let rows: Vec<PolicyRow> = coh
        .iter()
        .zip(&consumption)
        .map(|(&x, &c)| PolicyRow {
            cash_on_hand: x,
            consumption: c,
            savings: x - c,
            mpc: policy.mpc(x),
        })
        .collect();

    if format == OutputFormat::Table {
        print_header(&format!("Consumption Policy, State {state}"));
        println!(
            "Income: {:.6}   Constrained up to cash-on-hand {:.6}",
            calibration.income[state], threshold
        );
        println!();
    }
    print_output(&rows, format)
}
