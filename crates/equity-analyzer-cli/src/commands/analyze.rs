use clap::Args;
use serde_json::Value;

use equity_analyzer_core::{analyze, run_analysis};

use super::monte_carlo::SimulationArgs;
use super::{AssumptionArgs, SourceArgs};
use crate::input;

/// Arguments for the full analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    #[command(flatten)]
    pub simulation: SimulationArgs,

    /// Report failures inside the result instead of exiting with an error
    #[arg(long)]
    pub lenient: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let snapshot = input::load_snapshot(args.source.input.as_deref())?;
    let mut config = input::load_config(args.source.config.as_deref())?;
    args.assumptions.apply(&mut config);
    args.simulation.apply(&mut config.monte_carlo);

    if args.lenient {
        let report = analyze(&snapshot, &config);
        return Ok(serde_json::to_value(report)?);
    }

    let output = run_analysis(&snapshot, &config)?;
    Ok(serde_json::to_value(output)?)
}
