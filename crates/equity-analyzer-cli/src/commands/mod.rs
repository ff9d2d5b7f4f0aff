pub mod analyze;
pub mod metrics;
pub mod monte_carlo;
pub mod valuation;

use clap::Args;
use rust_decimal::Decimal;

use equity_analyzer_core::analysis::{growth_for, GrowthSource};
use equity_analyzer_core::valuation::DcfAssumptions;
use equity_analyzer_core::{AnalysisConfig, CompanyFinancials};

use crate::input;

/// Where the snapshot and configuration come from
#[derive(Args)]
pub struct SourceArgs {
    /// Path to the company snapshot JSON (read from stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a YAML or JSON analysis configuration
    #[arg(long)]
    pub config: Option<String>,
}

/// Flags that take precedence over the configuration file
#[derive(Args)]
pub struct AssumptionArgs {
    /// Base-case discount rate (e.g. 0.08 for 8%)
    #[arg(long)]
    pub wacc: Option<Decimal>,

    /// Perpetual growth after the projection horizon
    #[arg(long, allow_hyphen_values = true)]
    pub terminal_growth: Option<Decimal>,

    /// Growth used when the snapshot has no estimate
    #[arg(long, allow_hyphen_values = true)]
    pub default_growth: Option<Decimal>,

    /// Override the snapshot growth estimate
    #[arg(long, allow_hyphen_values = true)]
    pub growth_rate: Option<Decimal>,

    /// Override the current share price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Override earnings per share
    #[arg(long, allow_hyphen_values = true)]
    pub eps: Option<Decimal>,

    /// Override book value per share
    #[arg(long)]
    pub book_value_per_share: Option<Decimal>,

    /// Override shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Override trailing free cash flow
    #[arg(long, allow_hyphen_values = true)]
    pub free_cash_flow: Option<Decimal>,
}

impl AssumptionArgs {
    /// Layer the flags over `config`.
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(v) = self.wacc {
            config.wacc = v;
        }
        if let Some(v) = self.terminal_growth {
            config.terminal_growth = v;
        }
        if let Some(v) = self.default_growth {
            config.default_growth = v;
        }
        let overrides = &mut config.overrides;
        overrides.growth_rate = self.growth_rate.or(overrides.growth_rate);
        overrides.price = self.price.or(overrides.price);
        overrides.eps = self.eps.or(overrides.eps);
        overrides.book_value_per_share = self.book_value_per_share.or(overrides.book_value_per_share);
        overrides.shares_outstanding = self.shares_outstanding.or(overrides.shares_outstanding);
        overrides.free_cash_flow = self.free_cash_flow.or(overrides.free_cash_flow);
    }
}

/// Snapshot and configuration ready for a single-stage command: flags
/// applied, configuration validated, overrides merged.
pub struct Prepared {
    pub snapshot: CompanyFinancials,
    pub config: AnalysisConfig,
    pub base: DcfAssumptions,
    /// One note per applied override
    pub notes: Vec<String>,
    /// Set when the base growth fell back to the configured default
    pub growth_note: Option<String>,
}

impl Prepared {
    /// Override notes followed by the growth note, for valuation commands.
    pub fn valuation_notes(&self) -> Vec<String> {
        self.notes.iter().chain(self.growth_note.iter()).cloned().collect()
    }
}

pub fn prepare(
    source: &SourceArgs,
    assumptions: &AssumptionArgs,
) -> Result<Prepared, Box<dyn std::error::Error>> {
    let raw = input::load_snapshot(source.input.as_deref())?;
    let mut config = input::load_config(source.config.as_deref())?;
    assumptions.apply(&mut config);
    config.validate()?;

    let (snapshot, notes) = config.overrides.apply(&raw)?;
    let (growth, growth_source) = growth_for(&snapshot, &config);
    let growth_note = (growth_source == GrowthSource::AssumedDefault).then(|| {
        format!(
            "Default growth rate used ({}%)",
            (growth * Decimal::ONE_HUNDRED).round_dp(2)
        )
    });
    let base = DcfAssumptions::new(config.wacc, growth, config.terminal_growth);

    Ok(Prepared {
        snapshot,
        config,
        base,
        notes,
        growth_note,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        assumptions: AssumptionArgs,
    }

    fn parse(args: &[&str]) -> AssumptionArgs {
        let argv = std::iter::once("eqa").chain(args.iter().copied());
        Harness::parse_from(argv).assumptions
    }

    #[test]
    fn test_book_value_per_share_flag_sets_override() {
        let mut config = AnalysisConfig::default();
        parse(&["--book-value-per-share", "12.5"]).apply(&mut config);
        assert_eq!(
            config.overrides.book_value_per_share,
            Some(Decimal::new(125, 1))
        );
    }

    #[test]
    fn test_flags_layer_over_config_overrides() {
        let mut config = AnalysisConfig::default();
        config.overrides.book_value_per_share = Some(Decimal::TEN);
        config.overrides.eps = Some(Decimal::ONE);
        parse(&["--eps", "-0.5"]).apply(&mut config);
        assert_eq!(config.overrides.eps, Some(Decimal::new(-5, 1)));
        assert_eq!(config.overrides.book_value_per_share, Some(Decimal::TEN));
    }
}
