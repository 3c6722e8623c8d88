//! Income command implementation.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use smoothsim_household::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::RecipeArgs;
use crate::output::{fixed, percent, print_header, print_output};

/// Arguments for the income command.
#[derive(Args, Debug)]
pub struct IncomeArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

/// One state of the income chain.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct IncomeRow {
    #[tabled(rename = "State")]
    pub state: usize,
    #[tabled(rename = "Income", display_with = "fixed")]
    pub income: f64,
    #[tabled(rename = "Probability", display_with = "percent")]
    pub probability: f64,
    #[tabled(rename = "Discount Factor", display_with = "fixed")]
    pub discount_factor: f64,
}

/// Execute the income command.
pub fn execute(args: IncomeArgs, format: OutputFormat) -> Result<()> {
    let recipe = args.recipe.recipe()?;
    let calibration = recipe.build()?;

    let stationary = stationary_distribution(
        calibration.transition.view(),
        recipe.solver.stationary_tolerance,
        recipe.solver.stationary_max_iterations,
    )?;
    let betas = calibration.discount_factors();

    let rows: Vec<IncomeRow> = (0..calibration.n_states())
        .map(|s| IncomeRow {
            state: s,
            income: calibration.income[s],
            probability: stationary[s],
            discount_factor: betas[s],
        })
        .collect();

    if format == OutputFormat::Table {
        print_header("Income Process");
        println!("Mean income: {:.6}", stationary.dot(&calibration.income));
        println!();
    }
    print_output(&rows, format)
}
