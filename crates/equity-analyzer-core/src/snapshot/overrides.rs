//! Caller-supplied replacements for a subset of snapshot fields.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::financials::CompanyFinancials;
use crate::error::EquityAnalyzerError;
use crate::types::{Money, Rate};
use crate::EquityAnalyzerResult;

/// Allow-listed numeric overrides. Every field left as `None` keeps the
/// provider value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SnapshotOverrides {
    pub price: Option<Money>,
    pub eps: Option<Money>,
    pub growth_rate: Option<Rate>,
    pub book_value_per_share: Option<Money>,
    pub shares_outstanding: Option<Decimal>,
    pub free_cash_flow: Option<Money>,
}

impl SnapshotOverrides {
    pub fn is_empty(&self) -> bool {
        *self == SnapshotOverrides::default()
    }

    /// Range-check every provided field.
    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        if let Some(price) = self.price {
            if price <= Decimal::ZERO {
                return Err(invalid("price", "Price override must be positive"));
            }
        }
        if let Some(shares) = self.shares_outstanding {
            if shares <= Decimal::ZERO {
                return Err(invalid(
                    "shares_outstanding",
                    "Shares outstanding override must be positive",
                ));
            }
        }
        if let Some(g) = self.growth_rate {
            if g <= dec!(-1) || g > dec!(5) {
                return Err(invalid(
                    "growth_rate",
                    "Growth rate override must lie in (-100%, 500%]",
                ));
            }
        }
        if let Some(bvps) = self.book_value_per_share {
            if bvps < Decimal::ZERO {
                return Err(invalid(
                    "book_value_per_share",
                    "Book value per share override cannot be negative",
                ));
            }
        }
        Ok(())
    }

    /// Merge onto `snapshot`, returning the merged copy and one note per
    /// applied override.
    pub fn apply(
        &self,
        snapshot: &CompanyFinancials,
    ) -> EquityAnalyzerResult<(CompanyFinancials, Vec<String>)> {
        self.validate()?;

        let mut merged = snapshot.clone();
        let mut notes = Vec::new();

        if let Some(v) = self.price {
            merged.price = Some(v);
            notes.push(format!("Current price forced to {v}"));
        }
        if let Some(v) = self.eps {
            merged.eps = Some(v);
            notes.push(format!("Earnings per share forced to {v}"));
        }
        if let Some(v) = self.growth_rate {
            merged.growth_rate = Some(v);
            notes.push(format!(
                "Expected growth forced to {}%",
                (v * dec!(100)).round_dp(2)
            ));
        }
        if let Some(v) = self.book_value_per_share {
            merged.book_value_per_share = Some(v);
            notes.push(format!("Book value per share forced to {v}"));
        }
        if let Some(v) = self.shares_outstanding {
            merged.shares_outstanding = v;
            notes.push(format!("Shares outstanding forced to {v}"));
        }
        if let Some(v) = self.free_cash_flow {
            merged.free_cash_flow = Some(v);
            notes.push(format!("Free cash flow forced to {v}"));
        }
        // A reported market cap is stale once price or share count moves
        let moves_cap = self.price.is_some() || self.shares_outstanding.is_some();
        if moves_cap && merged.market_cap.is_some() {
            merged.market_cap = None;
            if let Some(cap) = merged.market_cap() {
                notes.push(format!("Market cap recomputed as {cap} from price and shares"));
            }
        }

        Ok((merged, notes))
    }
}

fn invalid(field: &str, reason: &str) -> EquityAnalyzerError {
    EquityAnalyzerError::InvalidInput {
        field: format!("overrides.{field}"),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> CompanyFinancials {
        CompanyFinancials {
            ticker: "ACME".into(),
            price: Some(dec!(40)),
            eps: Some(dec!(2)),
            shares_outstanding: dec!(500),
            free_cash_flow: Some(dec!(1200)),
            growth_rate: Some(dec!(0.04)),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_overrides_leave_snapshot_untouched() {
        let overrides = SnapshotOverrides::default();
        assert!(overrides.is_empty());
        let (merged, notes) = overrides.apply(&snapshot()).unwrap();
        assert!(notes.is_empty());
        assert_eq!(merged.price, Some(dec!(40)));
        assert_eq!(merged.free_cash_flow, Some(dec!(1200)));
    }

    #[test]
    fn test_overridden_fields_replace_provider_values() {
        let overrides = SnapshotOverrides {
            price: Some(dec!(55)),
            growth_rate: Some(dec!(0.12)),
            shares_outstanding: Some(dec!(600)),
            ..Default::default()
        };
        let (merged, notes) = overrides.apply(&snapshot()).unwrap();
        assert_eq!(merged.price, Some(dec!(55)));
        assert_eq!(merged.growth_rate, Some(dec!(0.12)));
        assert_eq!(merged.shares_outstanding, dec!(600));
        // untouched
        assert_eq!(merged.eps, Some(dec!(2)));
        assert_eq!(notes.len(), 3);
        assert!(notes[1].contains("12"));
    }

    #[test]
    fn test_price_override_recomputes_reported_market_cap() {
        let reported = CompanyFinancials {
            market_cap: Some(dec!(20000)),
            ..snapshot()
        };
        let overrides = SnapshotOverrides {
            price: Some(dec!(60)),
            ..Default::default()
        };
        let (merged, notes) = overrides.apply(&reported).unwrap();
        assert_eq!(merged.market_cap(), Some(dec!(30000)));
        assert!(merged.consistency_checks().is_empty());
        assert!(notes.iter().any(|n| n.contains("Market cap recomputed")));
    }

    #[test]
    fn test_unrelated_override_keeps_reported_market_cap() {
        let reported = CompanyFinancials {
            market_cap: Some(dec!(20500)),
            ..snapshot()
        };
        let overrides = SnapshotOverrides {
            eps: Some(dec!(3)),
            ..Default::default()
        };
        let (merged, _) = overrides.apply(&reported).unwrap();
        assert_eq!(merged.market_cap, Some(dec!(20500)));
    }

    #[test]
    fn test_non_positive_price_rejected() {
        let overrides = SnapshotOverrides {
            price: Some(Decimal::ZERO),
            ..Default::default()
        };
        match overrides.apply(&snapshot()).unwrap_err() {
            EquityAnalyzerError::InvalidInput { field, .. } => {
                assert_eq!(field, "overrides.price")
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_growth_out_of_range_rejected() {
        let overrides = SnapshotOverrides {
            growth_rate: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(overrides.validate().is_err());
    }

    #[test]
    fn test_unknown_override_field_rejected_on_deserialize() {
        let json = r#"{"price": 10, "ebitda": 5}"#;
        assert!(serde_json::from_str::<SnapshotOverrides>(json).is_err());
    }
}
