use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::altman::{altman_z_score, ZScoreZone};
use super::multiples::{multiples_analysis, RatioRow, RatioVerdict, DEFAULT_RATIO_THRESHOLD};
use super::piotroski::{piotroski_score, PiotroskiScore};
use crate::snapshot::CompanyFinancials;
use crate::types::{ratio, ratio_opt, with_metadata, ComputationOutput, Money, Rate};
use crate::EquityAnalyzerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedMetrics {
    /// Net income / (equity + net debt)
    pub roic: Option<Rate>,
    /// Free cash flow / market cap
    pub fcf_yield: Option<Rate>,
    /// Net income / revenue. Named operating margin for display; EBIT is not
    /// used.
    pub operating_margin: Option<Rate>,
    pub piotroski_score: u8,
    pub piotroski: PiotroskiScore,
    pub altman_z_score: Option<Decimal>,
    pub altman_zone: Option<ZScoreZone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invested_capital: Option<Money>,
}

/// Ratio table plus advanced metrics, as returned by [`calculate_metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsOutput {
    pub multiples: Vec<RatioRow>,
    pub advanced: AdvancedMetrics,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Equity plus net debt. Net debt is taken as zero when unknown; a
/// non-positive total is treated as unavailable.
pub fn invested_capital(snapshot: &CompanyFinancials) -> Option<Money> {
    let equity = snapshot.total_equity()?;
    let capital = equity + snapshot.net_debt().unwrap_or(Decimal::ZERO);
    (capital > Decimal::ZERO).then_some(capital)
}

pub fn advanced_metrics(snapshot: &CompanyFinancials) -> AdvancedMetrics {
    let invested = invested_capital(snapshot);
    let roic = ratio_opt(snapshot.net_income, invested);
    let fcf_yield = match (snapshot.free_cash_flow, snapshot.market_cap()) {
        (Some(fcf), Some(mcap)) if mcap > Decimal::ZERO => ratio(fcf, mcap),
        _ => None,
    };
    let operating_margin = ratio_opt(snapshot.net_income, snapshot.revenue);

    let piotroski = piotroski_score(snapshot);
    let z = altman_z_score(snapshot);

    AdvancedMetrics {
        roic,
        fcf_yield,
        operating_margin,
        piotroski_score: piotroski.f_score,
        piotroski,
        altman_z_score: z.as_ref().map(|z| z.score),
        altman_zone: z.map(|z| z.zone),
        invested_capital: invested,
    }
}

/// Ratio rows and advanced metrics at the default ±10% verdict threshold.
pub fn compute(snapshot: &CompanyFinancials) -> (Vec<RatioRow>, AdvancedMetrics) {
    compute_with_threshold(snapshot, DEFAULT_RATIO_THRESHOLD)
}

pub fn compute_with_threshold(
    snapshot: &CompanyFinancials,
    threshold: Rate,
) -> (Vec<RatioRow>, AdvancedMetrics) {
    (
        multiples_analysis(snapshot, threshold),
        advanced_metrics(snapshot),
    )
}

/// Standalone metrics run with the standard output envelope.
pub fn calculate_metrics(
    snapshot: &CompanyFinancials,
    threshold: Rate,
) -> EquityAnalyzerResult<ComputationOutput<MetricsOutput>> {
    let start = Instant::now();
    snapshot.validate()?;
    let mut warnings: Vec<String> = Vec::new();

    let (multiples, advanced) = compute_with_threshold(snapshot, threshold);

    let missing: Vec<&str> = multiples
        .iter()
        .filter(|r| r.verdict == RatioVerdict::InsufficientData)
        .map(|r| r.name.as_str())
        .collect();
    if !missing.is_empty() {
        warnings.push(format!("Insufficient data for: {}", missing.join(", ")));
    }
    if advanced.altman_z_score.is_none() {
        warnings.push("Altman Z-Score unavailable (missing balance-sheet inputs)".into());
    }
    if advanced.piotroski.evaluated < 9 {
        warnings.push(format!(
            "Piotroski: only {} of 9 indicators had data",
            advanced.piotroski.evaluated
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multiples vs sector/history, ROIC, FCF yield, Piotroski F-Score, Altman Z-Score",
        &serde_json::json!({ "ratio_threshold": threshold }),
        warnings,
        elapsed,
        MetricsOutput {
            multiples,
            advanced,
        },
    ))
}
