use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityAnalyzerError;
use crate::metrics::multiples::DEFAULT_RATIO_THRESHOLD;
#[cfg(feature = "monte_carlo")]
use crate::monte_carlo::MonteCarloConfig;
use crate::scoring::verdict::DEFAULT_VERDICT_THRESHOLD;
use crate::scoring::ScoreWeights;
use crate::snapshot::SnapshotOverrides;
use crate::types::Rate;
use crate::valuation::dcf::DEFAULT_GROWTH_RATE;
use crate::valuation::ScenarioDefinition;
use crate::EquityAnalyzerResult;

pub const DEFAULT_WACC: Rate = dec!(0.08);
pub const DEFAULT_TERMINAL_GROWTH: Rate = dec!(0.025);

/// Everything an analysis run can be tuned with. Every field has a default,
/// so an empty YAML/JSON document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Base-case discount rate
    pub wacc: Rate,
    /// Base-case perpetual growth after year 5
    pub terminal_growth: Rate,
    /// Growth used when neither the snapshot nor an override provides one
    pub default_growth: Rate,
    pub overrides: SnapshotOverrides,
    pub scenarios: Vec<ScenarioDefinition>,
    #[cfg(feature = "monte_carlo")]
    pub monte_carlo: MonteCarloConfig,
    pub score_weights: ScoreWeights,
    /// Intrinsic-vs-price gap that flips the verdict
    pub verdict_threshold: Rate,
    /// Multiple-vs-benchmark deviation that flips a ratio verdict
    pub ratio_threshold: Rate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            wacc: DEFAULT_WACC,
            terminal_growth: DEFAULT_TERMINAL_GROWTH,
            default_growth: DEFAULT_GROWTH_RATE,
            overrides: SnapshotOverrides::default(),
            scenarios: ScenarioDefinition::defaults(),
            #[cfg(feature = "monte_carlo")]
            monte_carlo: MonteCarloConfig::default(),
            score_weights: ScoreWeights::default(),
            verdict_threshold: DEFAULT_VERDICT_THRESHOLD,
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
        }
    }
}

impl AnalysisConfig {
    /// Field-level validation. Scenario feasibility (WACC above terminal
    /// growth) is checked when scenarios are resolved.
    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        for (field, value) in [
            ("verdict_threshold", self.verdict_threshold),
            ("ratio_threshold", self.ratio_threshold),
        ] {
            if value <= Decimal::ZERO || value >= Decimal::ONE {
                return Err(EquityAnalyzerError::InvalidInput {
                    field: field.into(),
                    reason: format!("Must be between 0 and 1 exclusive (got {value})"),
                });
            }
        }
        if self.default_growth <= dec!(-1) || self.default_growth > dec!(5) {
            return Err(EquityAnalyzerError::InvalidInput {
                field: "default_growth".into(),
                reason: "Must be greater than -100% and at most 500%".into(),
            });
        }
        self.overrides.validate()?;
        self.score_weights.validate()?;
        #[cfg(feature = "monte_carlo")]
        self.monte_carlo.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = AnalysisConfig::default();
        assert_eq!(c.wacc, dec!(0.08));
        assert_eq!(c.terminal_growth, dec!(0.025));
        assert_eq!(c.scenarios.len(), 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_json_is_default() {
        let c: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(c, AnalysisConfig::default());
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let c: AnalysisConfig =
            serde_json::from_str(r#"{"wacc": "0.09", "overrides": {"price": "12.5"}}"#).unwrap();
        assert_eq!(c.wacc, dec!(0.09));
        assert_eq!(c.terminal_growth, DEFAULT_TERMINAL_GROWTH);
        assert_eq!(c.overrides.price, Some(dec!(12.5)));
    }

    #[test]
    fn test_unknown_override_field_rejected() {
        let parsed: Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"overrides": {"beta": "1.2"}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let c = AnalysisConfig {
            verdict_threshold: Decimal::ZERO,
            ..Default::default()
        };
        assert!(c.validate().is_err());
    }
}
