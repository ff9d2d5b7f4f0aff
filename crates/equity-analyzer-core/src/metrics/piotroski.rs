use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::CompanyFinancials;

/// Individual indicator results and the composite F-Score.
///
/// An indicator whose inputs are missing counts as `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PiotroskiScore {
    // Profitability signals
    pub roa_positive: bool,
    pub cfo_positive: bool,
    pub delta_roa_positive: bool,
    pub accruals_quality: bool,

    // Leverage / Liquidity signals
    pub leverage_decreasing: bool,
    pub current_ratio_increasing: bool,
    pub no_equity_dilution: bool,

    // Operating efficiency signals
    pub gross_margin_increasing: bool,
    pub asset_turnover_increasing: bool,

    /// Total score (0-9).
    pub f_score: u8,
    /// Number of indicators that had the data to be evaluated.
    pub evaluated: u8,
    /// Classification: "Strong" (7-9), "Moderate" (4-6), "Weak" (0-3).
    pub strength: String,
}

fn classify(score: u8) -> String {
    match score {
        7..=9 => "Strong".to_string(),
        4..=6 => "Moderate".to_string(),
        _ => "Weak".to_string(),
    }
}

/// `Some(a > b)` when both sides are known.
fn increased(current: Option<Decimal>, prior: Option<Decimal>) -> Option<bool> {
    Some(current? > prior?)
}

/// Compute the Piotroski F-Score from a snapshot.
pub fn piotroski_score(snapshot: &CompanyFinancials) -> PiotroskiScore {
    let prior = &snapshot.prior_year;
    let roa = snapshot.roa();
    let cfo = snapshot.operating_cash_flow;

    // Each entry is None when the inputs are missing
    let checks: [Option<bool>; 9] = [
        roa.map(|r| r > Decimal::ZERO),
        cfo.map(|c| c > Decimal::ZERO),
        increased(roa, prior.roa),
        increased(cfo, snapshot.net_income),
        increased(prior.leverage, snapshot.leverage),
        increased(snapshot.current_ratio, prior.current_ratio),
        // No dilution: shares this year <= shares last year
        prior
            .shares_outstanding
            .map(|p| snapshot.shares_outstanding <= p),
        increased(snapshot.gross_margin, prior.gross_margin),
        increased(snapshot.asset_turnover(), prior.asset_turnover),
    ];

    let signals = checks.map(|c| c.unwrap_or(false));
    let f_score = signals.iter().filter(|&&s| s).count() as u8;
    let evaluated = checks.iter().filter(|c| c.is_some()).count() as u8;

    PiotroskiScore {
        roa_positive: signals[0],
        cfo_positive: signals[1],
        delta_roa_positive: signals[2],
        accruals_quality: signals[3],
        leverage_decreasing: signals[4],
        current_ratio_increasing: signals[5],
        no_equity_dilution: signals[6],
        gross_margin_increasing: signals[7],
        asset_turnover_increasing: signals[8],
        f_score,
        evaluated,
        strength: classify(f_score),
    }
}
