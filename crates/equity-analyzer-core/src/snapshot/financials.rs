//! Company fundamentals snapshot consumed by every stage of the analysis.
//!
//! The market-data provider fills this structure; the engine never mutates it
//! once an analysis starts. Optional fields are `None` when the provider has
//! no value, and each derived accessor documents its fallback.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityAnalyzerError;
use crate::types::{ratio, ratio_opt, Money, Multiple, Rate};
use crate::EquityAnalyzerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A set of valuation multiples, used both for sector benchmarks and for the
/// company's own 5-year history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultipleSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pb: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ps: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ev_ebitda: Option<Multiple>,
}

/// Prior fiscal-year values needed by the Piotroski trend indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriorYearFundamentals {
    pub roa: Option<Rate>,
    /// Long-term debt / total assets
    pub leverage: Option<Rate>,
    pub current_ratio: Option<Decimal>,
    pub gross_margin: Option<Rate>,
    /// Revenue / total assets
    pub asset_turnover: Option<Decimal>,
    pub shares_outstanding: Option<Decimal>,
}

/// Snapshot of a company's fundamentals for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyFinancials {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    /// Display label only; all amounts are assumed to share one currency.
    pub currency: Option<String>,
    /// Date the provider captured the fundamentals
    pub as_of: Option<NaiveDate>,

    // Market data
    pub price: Option<Money>,
    pub eps: Option<Money>,
    pub shares_outstanding: Decimal,
    pub market_cap: Option<Money>,
    pub beta: Option<Decimal>,
    pub dividend_per_share: Option<Money>,
    pub book_value_per_share: Option<Money>,

    // Income statement / cash flow
    pub revenue: Option<Money>,
    pub net_income: Option<Money>,
    pub ebitda: Option<Money>,
    pub ebit: Option<Money>,
    pub free_cash_flow: Option<Money>,
    pub operating_cash_flow: Option<Money>,

    // Balance sheet
    pub net_debt: Option<Money>,
    pub total_debt: Option<Money>,
    pub total_cash: Option<Money>,
    pub total_equity: Option<Money>,
    pub working_capital: Option<Money>,
    pub total_assets: Option<Money>,
    pub total_liabilities: Option<Money>,
    pub retained_earnings: Option<Money>,

    // Ratios reported by the provider
    pub growth_rate: Option<Rate>,
    pub net_margin: Option<Rate>,
    pub roe: Option<Rate>,
    pub roa: Option<Rate>,
    pub payout_ratio: Option<Rate>,
    pub leverage: Option<Rate>,
    pub current_ratio: Option<Decimal>,
    pub gross_margin: Option<Rate>,
    pub asset_turnover: Option<Decimal>,

    pub prior_year: PriorYearFundamentals,
    pub sector_multiples: Option<MultipleSet>,
    pub historical_multiples: MultipleSet,
}

// ---------------------------------------------------------------------------
// Sector benchmarks
// ---------------------------------------------------------------------------

const SECTOR_TABLE: &[(&str, [Decimal; 4])] = &[
    ("Technology", [dec!(27.0), dec!(8.0), dec!(6.0), dec!(20.0)]),
    ("Communication Services", [dec!(18.0), dec!(4.0), dec!(4.0), dec!(12.0)]),
    ("Consumer Cyclical", [dec!(22.0), dec!(5.0), dec!(2.0), dec!(13.0)]),
    ("Consumer Defensive", [dec!(21.0), dec!(4.0), dec!(2.5), dec!(14.0)]),
    ("Financial Services", [dec!(12.0), dec!(1.5), dec!(2.0), dec!(10.0)]),
    ("Healthcare", [dec!(20.0), dec!(4.0), dec!(5.0), dec!(13.0)]),
    ("Industrials", [dec!(18.0), dec!(3.0), dec!(1.5), dec!(11.0)]),
    ("Energy", [dec!(9.0), dec!(1.5), dec!(1.0), dec!(5.0)]),
    ("Basic Materials", [dec!(17.0), dec!(2.0), dec!(1.5), dec!(8.0)]),
    ("Utilities", [dec!(16.0), dec!(1.7), dec!(2.0), dec!(9.0)]),
    ("Real Estate", [dec!(25.0), dec!(2.2), dec!(6.0), dec!(18.0)]),
];

const DEFAULT_SECTOR: [Decimal; 4] = [dec!(18.0), dec!(2.5), dec!(2.0), dec!(10.0)];

impl MultipleSet {
    /// Built-in sector averages (P/E, P/B, P/S, EV/EBITDA). Unknown or
    /// missing sectors get the market-wide default row.
    pub fn for_sector(sector: Option<&str>) -> Self {
        let row = sector
            .and_then(|name| {
                SECTOR_TABLE
                    .iter()
                    .find(|(label, _)| label.eq_ignore_ascii_case(name.trim()))
            })
            .map(|(_, row)| *row)
            .unwrap_or(DEFAULT_SECTOR);
        MultipleSet {
            pe: Some(row[0]),
            pb: Some(row[1]),
            ps: Some(row[2]),
            ev_ebitda: Some(row[3]),
        }
    }
}

// ---------------------------------------------------------------------------
// Derived accessors
// ---------------------------------------------------------------------------

impl CompanyFinancials {
    /// Structural validation. Only the share count is required.
    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        if self.shares_outstanding <= Decimal::ZERO {
            return Err(EquityAnalyzerError::InvalidSnapshot {
                field: "shares_outstanding".into(),
                reason: format!(
                    "Shares outstanding must be positive (got {})",
                    self.shares_outstanding
                ),
            });
        }
        Ok(())
    }

    /// Reported net debt, else total debt minus cash.
    pub fn net_debt(&self) -> Option<Money> {
        self.net_debt.or_else(|| {
            self.total_debt
                .map(|debt| debt - self.total_cash.unwrap_or(Decimal::ZERO))
        })
    }

    /// Reported market cap, else price times shares.
    pub fn market_cap(&self) -> Option<Money> {
        self.market_cap.or_else(|| {
            self.price
                .filter(|p| *p > Decimal::ZERO)
                .map(|p| p * self.shares_outstanding)
        })
    }

    /// Reported equity, else book value per share times shares.
    pub fn total_equity(&self) -> Option<Money> {
        self.total_equity
            .or_else(|| self.book_value_per_share.map(|b| b * self.shares_outstanding))
    }

    /// Reported book value per share, else equity over shares.
    pub fn book_value_per_share(&self) -> Option<Money> {
        self.book_value_per_share.or_else(|| {
            self.total_equity
                .and_then(|eq| ratio(eq, self.shares_outstanding))
        })
    }

    /// Reported net margin, else net income over revenue.
    pub fn net_margin(&self) -> Option<Rate> {
        self.net_margin
            .or_else(|| ratio_opt(self.net_income, self.revenue))
    }

    /// Reported ROA, else net income over total assets.
    pub fn roa(&self) -> Option<Rate> {
        self.roa
            .or_else(|| ratio_opt(self.net_income, self.total_assets))
    }

    /// Reported asset turnover, else revenue over total assets.
    pub fn asset_turnover(&self) -> Option<Decimal> {
        self.asset_turnover
            .or_else(|| ratio_opt(self.revenue, self.total_assets))
    }

    /// Provider sector multiples, else the built-in table for `sector`.
    pub fn sector_multiples(&self) -> MultipleSet {
        self.sector_multiples
            .clone()
            .unwrap_or_else(|| MultipleSet::for_sector(self.sector.as_deref()))
    }

    /// Cross-field sanity checks. Each issue is a human-readable note; none is
    /// fatal.
    pub fn consistency_checks(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if let (Some(reported), Some(price)) = (self.market_cap, self.price) {
            let implied = price * self.shares_outstanding;
            if let Some(diff) = ratio((implied - reported).abs(), reported) {
                if diff > dec!(0.10) {
                    issues.push(format!(
                        "Implied market cap ({}) differs from reported market cap ({}) by more than 10%",
                        implied.round_dp(0),
                        reported.round_dp(0)
                    ));
                }
            }
        }

        if let (Some(ni), Some(eps)) = (self.net_income, self.eps) {
            if let Some(derived) = ratio(ni, self.shares_outstanding) {
                if let Some(diff) = ratio((derived - eps).abs(), eps.abs()) {
                    if diff > dec!(0.20) {
                        issues.push(
                            "Earnings per share inconsistent with reported net income (>20% gap)"
                                .to_string(),
                        );
                    }
                }
            }
        }

        if let (Some(equity), Some(bvps)) = (self.total_equity, self.book_value_per_share) {
            let implied = bvps * self.shares_outstanding;
            if let Some(diff) = ratio((implied - equity).abs(), equity) {
                if diff > dec!(0.25) {
                    issues.push(
                        "Book equity and book value per share diverge by more than 25%"
                            .to_string(),
                    );
                }
            }
        }

        issues
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
