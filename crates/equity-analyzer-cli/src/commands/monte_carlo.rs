use clap::Args;
use serde_json::Value;

use equity_analyzer_core::monte_carlo::{self, MonteCarloConfig};

use super::{prepare, AssumptionArgs, SourceArgs};

/// Simulation flags shared by `monte-carlo` and `analyze`
#[derive(Args)]
pub struct SimulationArgs {
    /// Number of Monte Carlo iterations
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Random seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SimulationArgs {
    pub fn apply(&self, config: &mut MonteCarloConfig) {
        if let Some(n) = self.iterations {
            config.iterations = n;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
    }
}

/// Arguments for the Monte Carlo valuation
#[derive(Args)]
pub struct MonteCarloArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    #[command(flatten)]
    pub simulation: SimulationArgs,
}

pub fn run_monte_carlo(args: MonteCarloArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut prepared = prepare(&args.source, &args.assumptions)?;
    args.simulation.apply(&mut prepared.config.monte_carlo);

    let notes = prepared.valuation_notes();
    let mut output = monte_carlo::simulate(
        &prepared.snapshot,
        &prepared.base,
        &prepared.config.monte_carlo,
    )?;
    output.warnings.splice(0..0, notes);
    Ok(serde_json::to_value(output)?)
}
