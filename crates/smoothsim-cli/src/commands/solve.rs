//! Solve command implementation.
//!
//! Runs the steady-state driver and reports aggregates by income state.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use tracing::info;

use smoothsim_household::prelude::*;

use crate::cli::OutputFormat;
use crate::commands::RecipeArgs;
use crate::output::{fixed, percent, print_header, print_json, print_output, print_table, KeyValue};

/// Arguments for the solve command.
#[derive(Args, Debug)]
pub struct SolveArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Also differentiate the aggregates with respect to a marginal-utility shock, with this step
    #[arg(long)]
    pub sensitivity: Option<f64>,

    /// Write the full steady state (policy coefficients, CDF) as JSON to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

/// Aggregates conditional on one income state.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StateRow {
    #[tabled(rename = "State")]
    pub state: usize,
    #[tabled(rename = "Income", display_with = "fixed")]
    pub income: f64,
    #[tabled(rename = "Probability", display_with = "percent")]
    pub probability: f64,
    #[tabled(rename = "Mean Assets", display_with = "fixed")]
    pub mean_assets: f64,
    #[tabled(rename = "Mean Consumption", display_with = "fixed")]
    pub mean_consumption: f64,
    #[tabled(rename = "Constrained", display_with = "percent")]
    pub constrained_share: f64,
}

/// Machine-readable summary of a solve.
#[derive(Debug, Clone, Serialize)]
struct SolveReport {
    aggregate_assets: f64,
    aggregate_consumption: f64,
    constrained_share: f64,
    backward_iterations: usize,
    forward_iterations: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<ShockSensitivity>,
    states: Vec<StateRow>,
}

/// Execute the solve command.
pub fn execute(args: SolveArgs, format: OutputFormat) -> Result<()> {
    let recipe = args.recipe.recipe()?;
    let calibration = recipe.build()?;

    let ss = steady_state(&calibration, &recipe.solver)?;
    let sensitivity = args
        .sensitivity
        .map(|step| shock_sensitivity(&calibration, &recipe.solver, step))
        .transpose()?;

    if let Some(path) = &args.save {
        let file = File::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &ss)?;
        info!(path = %path.display(), "steady state saved");
    }

    let states = state_rows(&calibration, &ss);

    match format {
        OutputFormat::Table => {
            let mut summary = vec![
                KeyValue::new("States", calibration.n_states().to_string()),
                KeyValue::new("Asset gridpoints", calibration.n_assets().to_string()),
                KeyValue::from_f64("Aggregate assets", ss.aggregate_assets, 8),
                KeyValue::from_f64("Aggregate consumption", ss.aggregate_consumption, 8),
                KeyValue::new(
                    "Constrained share",
                    percent(&ss.constrained_share()),
                ),
                KeyValue::new("Backward iterations", ss.backward_iterations.to_string()),
                KeyValue::new("Forward iterations", ss.forward_iterations.to_string()),
            ];
            if let Some(s) = &sensitivity {
                summary.push(KeyValue::from_f64("dA/dshock", s.aggregate_assets, 6));
                summary.push(KeyValue::from_f64("dC/dshock", s.aggregate_consumption, 6));
            }

            print_header("Steady State");
            print_table(&summary)?;
            print_header("By Income State");
            print_table(&states)?;
        }
        OutputFormat::Json => {
            let report = SolveReport {
                aggregate_assets: ss.aggregate_assets,
                aggregate_consumption: ss.aggregate_consumption,
                constrained_share: ss.constrained_share(),
                backward_iterations: ss.backward_iterations,
                forward_iterations: ss.forward_iterations,
                sensitivity,
                states,
            };
            print_json(&report)?;
        }
        OutputFormat::Csv => print_output(&states, format)?,
    }

    Ok(())
}

fn state_rows(calibration: &Calibration, ss: &SteadyState) -> Vec<StateRow> {
    let constrained = ss.constrained_share_by_state();
    (0..ss.n_states())
        .map(|s| StateRow {
            state: s,
            income: calibration.income[s],
            probability: ss.stationary[s],
            mean_assets: ss.assets_by_state[s],
            mean_consumption: ss.consumption_by_state[s],
            constrained_share: constrained[s],
        })
        .collect()
}
