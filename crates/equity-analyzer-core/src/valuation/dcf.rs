use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::EquityAnalyzerError;
use crate::snapshot::CompanyFinancials;
use crate::time_value::{compound_factor, gordon_terminal_value, present_value};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EquityAnalyzerResult;

/// Number of explicit forecast periods before the terminal value.
pub const PROJECTION_YEARS: u32 = 5;

/// Growth assumed when neither the caller nor the snapshot supplies one.
pub const DEFAULT_GROWTH_RATE: Rate = dec!(0.05);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One assumption triple for the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DcfAssumptions {
    pub wacc: Rate,
    pub growth_rate: Rate,
    pub terminal_growth: Rate,
}

impl DcfAssumptions {
    pub fn new(wacc: Rate, growth_rate: Rate, terminal_growth: Rate) -> Self {
        Self {
            wacc,
            growth_rate,
            terminal_growth,
        }
    }

    /// `wacc > terminal_growth` and `wacc > -100%`.
    pub fn validate(&self, label: &str) -> EquityAnalyzerResult<()> {
        if self.wacc <= self.terminal_growth {
            return Err(EquityAnalyzerError::InvalidAssumptions {
                scenario: label.to_string(),
                reason: format!(
                    "WACC ({}) must exceed terminal growth ({})",
                    self.wacc, self.terminal_growth
                ),
            });
        }
        if self.wacc <= dec!(-1) {
            return Err(EquityAnalyzerError::InvalidAssumptions {
                scenario: label.to_string(),
                reason: "WACC must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}

/// A single projected year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfYear {
    pub year: u32,
    pub fcf: Money,
    pub pv_fcf: Money,
}

/// Full breakdown of one DCF evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfProjection {
    pub projections: Vec<DcfYear>,
    /// Sum of present values of the explicit-period FCFs
    pub pv_of_fcf: Money,
    pub terminal_value: Money,
    pub pv_of_terminal: Money,
    pub enterprise_value: Money,
    /// Net debt subtracted in the equity bridge (zero when unknown)
    pub net_debt_used: Money,
    pub equity_value: Money,
    pub intrinsic_value_per_share: Money,
    /// PV of terminal value as a share of enterprise value
    pub terminal_value_pct: Rate,
    pub assumptions: DcfAssumptions,
}

/// Standalone DCF request: a snapshot plus an assumption triple, where the
/// growth rate falls back to the snapshot and then to the 5% default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfInput {
    pub snapshot: CompanyFinancials,
    pub wacc: Rate,
    pub terminal_growth: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Intrinsic value per share for one assumption triple.
///
/// Returns `Ok(None)` when the snapshot has no free cash flow, so callers can
/// render "insufficient data" instead of failing.
pub fn evaluate(
    snapshot: &CompanyFinancials,
    wacc: Rate,
    growth_rate: Rate,
    terminal_growth: Rate,
) -> EquityAnalyzerResult<Option<Money>> {
    let assumptions = DcfAssumptions::new(wacc, growth_rate, terminal_growth);
    Ok(project(snapshot, &assumptions)?.map(|p| p.intrinsic_value_per_share))
}

/// Like [`evaluate`], keeping the per-year breakdown.
pub fn project(
    snapshot: &CompanyFinancials,
    assumptions: &DcfAssumptions,
) -> EquityAnalyzerResult<Option<DcfProjection>> {
    assumptions.validate("dcf")?;
    snapshot.validate()?;

    match snapshot.free_cash_flow {
        Some(base_fcf) => project_cash_flows(
            base_fcf,
            snapshot.net_debt(),
            snapshot.shares_outstanding,
            assumptions,
        )
        .map(Some),
        None => Ok(None),
    }
}

/// Run a standalone DCF with the standard output envelope.
pub fn calculate_dcf(input: &DcfInput) -> EquityAnalyzerResult<ComputationOutput<DcfProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let growth_rate = match input.growth_rate.or(input.snapshot.growth_rate) {
        Some(g) => g,
        None => {
            warnings.push(format!(
                "No growth estimate available; default growth of {}% used",
                DEFAULT_GROWTH_RATE * dec!(100)
            ));
            DEFAULT_GROWTH_RATE
        }
    };
    let assumptions = DcfAssumptions::new(input.wacc, growth_rate, input.terminal_growth);

    let projection = project(&input.snapshot, &assumptions)?.ok_or_else(|| {
        EquityAnalyzerError::MissingMetricInput {
            metric: "DCF intrinsic value".into(),
            input: "free_cash_flow".into(),
        }
    })?;

    if projection.terminal_value_pct > dec!(0.75) {
        warnings.push(format!(
            "Terminal value represents {:.1}% of enterprise value",
            projection.terminal_value_pct * dec!(100)
        ));
    }
    if input.snapshot.net_debt().is_none() {
        warnings.push("Net debt unknown; equity bridge assumes zero net debt".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "5-Year FCF DCF with Gordon Growth Terminal Value",
        &assumptions,
        warnings,
        elapsed,
        projection,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Core evaluator on raw inputs. Assumptions must already be validated and
/// `shares` must be positive.
pub(crate) fn project_cash_flows(
    base_fcf: Money,
    net_debt: Option<Money>,
    shares: Decimal,
    assumptions: &DcfAssumptions,
) -> EquityAnalyzerResult<DcfProjection> {
    let wacc = assumptions.wacc;
    let mut projections = Vec::with_capacity(PROJECTION_YEARS as usize);

    for year in 1..=PROJECTION_YEARS {
        let fcf = base_fcf * compound_factor(assumptions.growth_rate, year)?;
        let pv_fcf = present_value(fcf, wacc, year)?;
        projections.push(DcfYear { year, fcf, pv_fcf });
    }

    let pv_of_fcf: Money = projections.iter().map(|p| p.pv_fcf).sum();
    let final_fcf = projections
        .last()
        .map(|p| p.fcf)
        .unwrap_or(base_fcf);

    let terminal_value = gordon_terminal_value(final_fcf, wacc, assumptions.terminal_growth)?;
    let pv_of_terminal = present_value(terminal_value, wacc, PROJECTION_YEARS)?;

    let enterprise_value = pv_of_fcf + pv_of_terminal;
    let net_debt_used = net_debt.unwrap_or(Decimal::ZERO);
    let equity_value = enterprise_value - net_debt_used;

    if shares <= Decimal::ZERO {
        return Err(EquityAnalyzerError::InvalidSnapshot {
            field: "shares_outstanding".into(),
            reason: "Shares outstanding must be positive".into(),
        });
    }
    let intrinsic_value_per_share = equity_value / shares;

    let terminal_value_pct = if enterprise_value.is_zero() {
        Decimal::ZERO
    } else {
        pv_of_terminal / enterprise_value
    };

    Ok(DcfProjection {
        projections,
        pv_of_fcf,
        terminal_value,
        pv_of_terminal,
        enterprise_value,
        net_debt_used,
        equity_value,
        intrinsic_value_per_share,
        terminal_value_pct,
        assumptions: *assumptions,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> CompanyFinancials {
        CompanyFinancials {
            ticker: "ACME".into(),
            price: Some(dec!(50)),
            shares_outstanding: dec!(100),
            free_cash_flow: Some(dec!(1000)),
            net_debt: Some(dec!(2000)),
            growth_rate: Some(dec!(0.06)),
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_growth_closed_form() {
        // g = 0, tg = 0: EV = 1000 * annuity(5, 10%) + (1000 / 0.10) / 1.1^5
        // which collapses to the perpetuity 1000 / 0.10 = 10000.
        let snap = sample_snapshot();
        let out = project(&snap, &DcfAssumptions::new(dec!(0.10), dec!(0), dec!(0)))
            .unwrap()
            .unwrap();
        assert!((out.enterprise_value - dec!(10000)).abs() < dec!(0.000001));
        // (10000 - 2000) / 100
        let per_share = evaluate(&snap, dec!(0.10), dec!(0), dec!(0)).unwrap().unwrap();
        assert!((per_share - dec!(80)).abs() < dec!(0.000001));
    }

    #[test]
    fn test_year_one_projection() {
        let snap = sample_snapshot();
        let out = project(&snap, &DcfAssumptions::new(dec!(0.10), dec!(0.10), dec!(0.02)))
            .unwrap()
            .unwrap();
        assert_eq!(out.projections.len(), 5);
        assert_eq!(out.projections[0].fcf, dec!(1100));
        assert_eq!(out.projections[0].pv_fcf, dec!(1000));
        // FCF_5 = 1000 * 1.1^5
        assert_eq!(out.projections[4].fcf, dec!(1610.51));
    }

    #[test]
    fn test_terminal_value_formula() {
        let snap = sample_snapshot();
        let out = project(&snap, &DcfAssumptions::new(dec!(0.10), dec!(0.10), dec!(0.02)))
            .unwrap()
            .unwrap();
        // TV = 1610.51 * 1.02 / 0.08
        assert_eq!(out.terminal_value, dec!(1610.51) * dec!(1.02) / dec!(0.08));
        assert_eq!(out.equity_value, out.enterprise_value - dec!(2000));
    }

    #[test]
    fn test_wacc_equal_terminal_growth_rejected() {
        let snap = sample_snapshot();
        let err = evaluate(&snap, dec!(0.05), dec!(0.03), dec!(0.05)).unwrap_err();
        assert!(matches!(err, EquityAnalyzerError::InvalidAssumptions { .. }));
    }

    #[test]
    fn test_wacc_below_terminal_growth_rejected() {
        let snap = sample_snapshot();
        let err = evaluate(&snap, dec!(0.03), dec!(0.03), dec!(0.05)).unwrap_err();
        assert!(matches!(err, EquityAnalyzerError::InvalidAssumptions { .. }));
    }

    #[test]
    fn test_invalid_assumptions_reported_even_without_fcf() {
        let mut snap = sample_snapshot();
        snap.free_cash_flow = None;
        snap.shares_outstanding = Decimal::ZERO;
        let err = evaluate(&snap, dec!(0.02), dec!(0.03), dec!(0.02)).unwrap_err();
        assert!(matches!(err, EquityAnalyzerError::InvalidAssumptions { .. }));
    }

    #[test]
    fn test_non_positive_shares_rejected() {
        let mut snap = sample_snapshot();
        snap.shares_outstanding = dec!(-5);
        let err = evaluate(&snap, dec!(0.08), dec!(0.03), dec!(0.02)).unwrap_err();
        assert!(matches!(err, EquityAnalyzerError::InvalidSnapshot { .. }));
    }

    #[test]
    fn test_missing_fcf_yields_null_value() {
        let mut snap = sample_snapshot();
        snap.free_cash_flow = None;
        assert_eq!(evaluate(&snap, dec!(0.08), dec!(0.03), dec!(0.02)).unwrap(), None);
    }

    #[test]
    fn test_missing_net_debt_treated_as_zero() {
        let mut snap = sample_snapshot();
        snap.net_debt = None;
        let out = project(&snap, &DcfAssumptions::new(dec!(0.10), dec!(0), dec!(0)))
            .unwrap()
            .unwrap();
        assert_eq!(out.net_debt_used, Decimal::ZERO);
        assert_eq!(out.equity_value, out.enterprise_value);
    }

    #[test]
    fn test_negative_fcf_gives_finite_negative_value() {
        let mut snap = sample_snapshot();
        snap.free_cash_flow = Some(dec!(-500));
        let v = evaluate(&snap, dec!(0.09), dec!(0.04), dec!(0.02)).unwrap().unwrap();
        assert!(v < Decimal::ZERO);
    }

    #[test]
    fn test_valid_grid_always_returns_value() {
        let snap = sample_snapshot();
        for wacc in [dec!(0.03), dec!(0.08), dec!(0.15), dec!(0.30)] {
            for growth in [dec!(-0.20), dec!(0), dec!(0.10), dec!(0.40)] {
                for tg in [dec!(-0.02), dec!(0), dec!(0.025)] {
                    if wacc <= tg {
                        continue;
                    }
                    assert!(evaluate(&snap, wacc, growth, tg).unwrap().is_some());
                }
            }
        }
    }

    #[test]
    fn test_calculate_dcf_defaults_growth() {
        let mut snap = sample_snapshot();
        snap.growth_rate = None;
        let input = DcfInput {
            snapshot: snap,
            wacc: dec!(0.08),
            terminal_growth: dec!(0.025),
            growth_rate: None,
        };
        let out = calculate_dcf(&input).unwrap();
        assert_eq!(out.result.assumptions.growth_rate, DEFAULT_GROWTH_RATE);
        assert!(out.warnings.iter().any(|w| w.contains("default growth")));
    }

    #[test]
    fn test_calculate_dcf_requires_fcf() {
        let mut snap = sample_snapshot();
        snap.free_cash_flow = None;
        let input = DcfInput {
            snapshot: snap,
            wacc: dec!(0.08),
            terminal_growth: dec!(0.025),
            growth_rate: None,
        };
        assert!(matches!(
            calculate_dcf(&input).unwrap_err(),
            EquityAnalyzerError::MissingMetricInput { .. }
        ));
    }
}
