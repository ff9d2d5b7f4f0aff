use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equity_analyzer_core::metrics;

use super::{prepare, AssumptionArgs, SourceArgs};

/// Arguments for multiples and quality metrics
#[derive(Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,

    /// Deviation from the benchmark that flips a ratio verdict (e.g. 0.10)
    #[arg(long)]
    pub ratio_threshold: Option<Decimal>,
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut prepared = prepare(&args.source, &args.assumptions)?;
    if let Some(threshold) = args.ratio_threshold {
        prepared.config.ratio_threshold = threshold;
        prepared.config.validate()?;
    }

    let mut output =
        metrics::calculate_metrics(&prepared.snapshot, prepared.config.ratio_threshold)?;
    output.warnings.splice(0..0, prepared.notes);
    Ok(serde_json::to_value(output)?)
}
