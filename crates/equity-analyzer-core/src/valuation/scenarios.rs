use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::EquityAnalyzerError;
use crate::snapshot::CompanyFinancials;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::valuation::dcf::{self, DcfAssumptions};
use crate::EquityAnalyzerResult;

/// Scenario WACC never drops below this floor.
pub const SCENARIO_WACC_FLOOR: Rate = dec!(0.02);

/// Scenario terminal growth never drops below this floor.
pub const SCENARIO_TERMINAL_FLOOR: Rate = Decimal::ZERO;

const WEIGHT_TOLERANCE: Decimal = dec!(0.000000001);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How one named scenario shifts the base case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub weight: Decimal,
    /// Applied multiplicatively to the base growth rate
    pub growth_multiplier: Decimal,
    /// Added to the base WACC
    #[serde(default)]
    pub wacc_delta: Rate,
    /// Added to the base terminal growth
    #[serde(default)]
    pub terminal_growth_delta: Rate,
}

impl ScenarioDefinition {
    pub fn new(
        name: &str,
        weight: Decimal,
        growth_multiplier: Decimal,
        wacc_delta: Rate,
        terminal_growth_delta: Rate,
    ) -> Self {
        Self {
            name: name.to_string(),
            weight,
            growth_multiplier,
            wacc_delta,
            terminal_growth_delta,
        }
    }

    /// Bear / Base / Bull, weighted 25 / 50 / 25.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Bear", dec!(0.25), dec!(0.5), dec!(0.02), dec!(-0.01)),
            Self::new("Base", dec!(0.50), dec!(1.0), Decimal::ZERO, Decimal::ZERO),
            Self::new("Bull", dec!(0.25), dec!(1.2), dec!(-0.02), dec!(0.005)),
        ]
    }
}

/// A fully resolved scenario ready for the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAssumptions {
    pub name: String,
    pub wacc: Rate,
    pub growth_rate: Rate,
    pub terminal_growth: Rate,
    pub weight: Decimal,
}

impl ScenarioAssumptions {
    pub fn dcf_assumptions(&self) -> DcfAssumptions {
        DcfAssumptions::new(self.wacc, self.growth_rate, self.terminal_growth)
    }

    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        if self.weight < Decimal::ZERO || self.weight > Decimal::ONE {
            return Err(EquityAnalyzerError::InvalidAssumptions {
                scenario: self.name.clone(),
                reason: format!("Weight must be between 0 and 1 (got {})", self.weight),
            });
        }
        self.dcf_assumptions().validate(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    /// `None` when the snapshot lacks the data to value it
    pub intrinsic_value: Option<Money>,
    pub wacc: Rate,
    pub growth_rate: Rate,
    pub terminal_growth: Rate,
    pub weight: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfScenarioBlock {
    pub scenarios: Vec<ScenarioResult>,
    pub weighted_intrinsic_value: Option<Money>,
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Resolve scenario definitions against a base assumption triple.
///
/// Weights that do not sum to one are normalized and a warning is returned.
/// Negative weights or a zero total are rejected.
pub fn build_scenarios(
    definitions: &[ScenarioDefinition],
    base: &DcfAssumptions,
) -> EquityAnalyzerResult<(Vec<ScenarioAssumptions>, Vec<String>)> {
    let mut warnings = Vec::new();

    if definitions.is_empty() {
        return Err(EquityAnalyzerError::InvalidInput {
            field: "scenarios".into(),
            reason: "At least one scenario definition is required".into(),
        });
    }

    for d in definitions {
        if d.weight < Decimal::ZERO {
            return Err(EquityAnalyzerError::InvalidInput {
                field: format!("scenarios.{}.weight", d.name),
                reason: format!("Weight must be non-negative (got {})", d.weight),
            });
        }
    }

    // Validate and normalize weights
    let total: Decimal = definitions.iter().map(|d| d.weight).sum();
    if total.is_zero() {
        return Err(EquityAnalyzerError::InvalidInput {
            field: "scenarios".into(),
            reason: "Scenario weights sum to zero".into(),
        });
    }
    let normalize = (total - Decimal::ONE).abs() > WEIGHT_TOLERANCE;
    if normalize {
        let msg = format!("Scenario weights sum to {total}; normalized to 1.0");
        warn!(total = %total, "scenario weights normalized");
        warnings.push(msg);
    }

    let mut resolved = Vec::with_capacity(definitions.len());
    for d in definitions {
        let weight = if normalize { d.weight / total } else { d.weight };
        let scenario = ScenarioAssumptions {
            name: d.name.clone(),
            wacc: (base.wacc + d.wacc_delta).max(SCENARIO_WACC_FLOOR),
            growth_rate: base.growth_rate * d.growth_multiplier,
            terminal_growth: (base.terminal_growth + d.terminal_growth_delta)
                .max(SCENARIO_TERMINAL_FLOOR),
            weight,
        };
        scenario.validate()?;
        resolved.push(scenario);
    }

    Ok((resolved, warnings))
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Value every scenario and take the weighted sum of the non-null values.
///
/// A scenario with no value drops out of the sum; the remaining weights are
/// not renormalized.
pub fn aggregate(
    snapshot: &CompanyFinancials,
    scenarios: &[ScenarioAssumptions],
) -> EquityAnalyzerResult<DcfScenarioBlock> {
    let mut results = Vec::with_capacity(scenarios.len());

    for s in scenarios {
        s.validate()?;
        let value = dcf::evaluate(snapshot, s.wacc, s.growth_rate, s.terminal_growth)?;
        debug!(scenario = %s.name, value = ?value, "scenario valued");
        results.push(ScenarioResult {
            scenario: s.name.clone(),
            intrinsic_value: value,
            wacc: s.wacc,
            growth_rate: s.growth_rate,
            terminal_growth: s.terminal_growth,
            weight: s.weight,
        });
    }

    let weighted_intrinsic_value = if results.iter().all(|r| r.intrinsic_value.is_none()) {
        None
    } else {
        Some(
            results
                .iter()
                .filter_map(|r| r.intrinsic_value.map(|v| v * r.weight))
                .sum(),
        )
    };

    Ok(DcfScenarioBlock {
        scenarios: results,
        weighted_intrinsic_value,
    })
}

/// Resolve, value and weight the scenarios with the standard output
/// envelope. An infeasible base case fails before any scenario is built.
pub fn calculate_scenarios(
    snapshot: &CompanyFinancials,
    definitions: &[ScenarioDefinition],
    base: &DcfAssumptions,
) -> EquityAnalyzerResult<ComputationOutput<DcfScenarioBlock>> {
    let start = Instant::now();

    base.validate("base")?;
    let (scenarios, mut warnings) = build_scenarios(definitions, base)?;
    let block = aggregate(snapshot, &scenarios)?;
    if block.weighted_intrinsic_value.is_none() {
        warnings.push("No scenario could be valued (free cash flow missing)".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario-weighted 5-year FCF DCF",
        &serde_json::json!({ "base": base, "scenarios": scenarios }),
        warnings,
        elapsed,
        block,
    ))
}
