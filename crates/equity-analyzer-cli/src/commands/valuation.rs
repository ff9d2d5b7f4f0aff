use clap::Args;
use serde_json::Value;

use equity_analyzer_core::valuation::{self, DcfInput};

use super::{prepare, AssumptionArgs, SourceArgs};

/// Arguments for a single DCF valuation
#[derive(Args)]
pub struct DcfArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

/// Arguments for the scenario-weighted DCF
#[derive(Args)]
pub struct ScenariosArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

pub fn run_dcf(args: DcfArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let prepared = prepare(&args.source, &args.assumptions)?;
    let notes = prepared.valuation_notes();

    let dcf_input = DcfInput {
        snapshot: prepared.snapshot,
        wacc: prepared.base.wacc,
        terminal_growth: prepared.base.terminal_growth,
        growth_rate: Some(prepared.base.growth_rate),
    };
    let mut output = valuation::calculate_dcf(&dcf_input)?;
    output.warnings.splice(0..0, notes);
    Ok(serde_json::to_value(output)?)
}

pub fn run_scenarios(args: ScenariosArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let prepared = prepare(&args.source, &args.assumptions)?;
    let notes = prepared.valuation_notes();

    let mut output = valuation::calculate_scenarios(
        &prepared.snapshot,
        &prepared.config.scenarios,
        &prepared.base,
    )?;
    output.warnings.splice(0..0, notes);
    Ok(serde_json::to_value(output)?)
}
