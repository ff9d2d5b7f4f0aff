//! End-to-end analysis: overrides, valuation, metrics, scoring and verdict
//! assembled into one [`AnalysisResult`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use super::config::AnalysisConfig;
use crate::metrics::{compute_with_threshold, AdvancedMetrics, RatioRow};
#[cfg(feature = "monte_carlo")]
use crate::monte_carlo::{self, MonteCarloResult};
use crate::scoring::{
    build_recommendation, build_verdict, compose, investor_summary, RecommendationSection,
    ScoringSection, VerdictSection,
};
use crate::snapshot::{CompanyFinancials, MultipleSet};
use crate::types::{ratio, with_metadata, ComputationOutput, Money, Rate};
use crate::valuation::{
    aggregate, build_scenarios, project, DcfAssumptions, DcfProjection, DcfScenarioBlock,
};
use crate::EquityAnalyzerResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the growth rate used for valuation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthSource {
    Provider,
    Override,
    AssumedDefault,
}

/// Echo of the snapshot fields the analysis relied on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyData {
    pub ticker: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub currency: Option<String>,
    pub as_of: Option<NaiveDate>,
    pub price: Option<Money>,
    pub eps: Option<Money>,
    pub market_cap: Option<Money>,
    pub revenue: Option<Money>,
    pub net_income: Option<Money>,
    pub free_cash_flow: Option<Money>,
    pub net_debt: Option<Money>,
    pub growth_rate: Rate,
    pub growth_source: GrowthSource,
    pub net_margin: Option<Rate>,
    pub roe: Option<Rate>,
    pub roa: Option<Rate>,
    pub payout_ratio: Option<Rate>,
    pub beta: Option<Decimal>,
    pub sector_multiples: MultipleSet,
    /// Missing fields and consistency issues
    pub notes: Vec<String>,
}

/// Base-case DCF with its notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcfSection {
    pub projection: Option<DcfProjection>,
    pub intrinsic_value_per_share: Option<Money>,
    pub current_price: Option<Money>,
    pub wacc: Rate,
    pub growth_rate: Rate,
    pub terminal_growth: Rate,
    pub comparison: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub key_data: Option<KeyData>,
    pub multiples_analysis: Option<Vec<RatioRow>>,
    pub dcf: Option<DcfSection>,
    pub dcf_scenarios: Option<DcfScenarioBlock>,
    #[cfg(feature = "monte_carlo")]
    pub monte_carlo: Option<MonteCarloResult>,
    pub advanced_metrics: Option<AdvancedMetrics>,
    pub scoring: Option<ScoringSection>,
    pub verdict_final: Option<VerdictSection>,
    pub resume_investisseur: Option<String>,
    pub recommandation: Option<RecommendationSection>,
    /// Set only when the analysis could not be produced
    pub error: Option<String>,
}

impl AnalysisResult {
    /// A result carrying only the ticker and an error message.
    pub fn failed(ticker: &str, message: String) -> Self {
        Self {
            ticker: ticker.to_string(),
            error: Some(message),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ---------------------------------------------------------------------------
// Section builders
// ---------------------------------------------------------------------------

fn missing_field_notes(snapshot: &CompanyFinancials) -> Vec<String> {
    let checks: [(&str, bool); 10] = [
        ("Current price", snapshot.price.is_none()),
        ("Earnings per share", snapshot.eps.is_none()),
        ("Revenue", snapshot.revenue.is_none()),
        ("Net income", snapshot.net_income.is_none()),
        ("Free cash flow", snapshot.free_cash_flow.is_none()),
        ("Net debt", snapshot.net_debt().is_none()),
        ("Expected growth", snapshot.growth_rate.is_none()),
        ("Return on equity", snapshot.roe.is_none()),
        ("Return on assets", snapshot.roa().is_none()),
        ("Payout ratio", snapshot.payout_ratio.is_none()),
    ];
    checks
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(label, _)| format!("{label} missing"))
        .collect()
}

fn key_data(
    snapshot: &CompanyFinancials,
    growth_rate: Rate,
    growth_source: GrowthSource,
    notes: Vec<String>,
) -> KeyData {
    KeyData {
        ticker: snapshot.ticker.clone(),
        name: snapshot.name.clone(),
        sector: snapshot.sector.clone(),
        industry: snapshot.industry.clone(),
        currency: snapshot.currency.clone(),
        as_of: snapshot.as_of,
        price: snapshot.price,
        eps: snapshot.eps,
        market_cap: snapshot.market_cap(),
        revenue: snapshot.revenue,
        net_income: snapshot.net_income,
        free_cash_flow: snapshot.free_cash_flow,
        net_debt: snapshot.net_debt(),
        growth_rate,
        growth_source,
        net_margin: snapshot.net_margin(),
        roe: snapshot.roe,
        roa: snapshot.roa(),
        payout_ratio: snapshot.payout_ratio,
        beta: snapshot.beta,
        sector_multiples: snapshot.sector_multiples(),
        notes,
    }
}

/// One-line comparison of the price against the base-case intrinsic value.
pub fn describe_price_gap(price: Option<Money>, intrinsic: Option<Money>) -> String {
    let (price, intrinsic) = match (price, intrinsic) {
        (Some(p), Some(i)) => (p, i),
        _ => return "Comparison unavailable (missing data)".to_string(),
    };
    if intrinsic <= Decimal::ZERO {
        return "Intrinsic value is not positive; comparison not meaningful".to_string();
    }
    let gap = match ratio(price - intrinsic, intrinsic) {
        Some(g) => g,
        None => return "Comparison unavailable (missing data)".to_string(),
    };
    if gap.abs() < dec!(0.01) {
        return "Price aligned with intrinsic value".to_string();
    }
    let direction = if gap > Decimal::ZERO {
        "overvalued"
    } else {
        "undervalued"
    };
    format!("Stock {direction} by {:.1}%", gap.abs() * dec!(100))
}

/// Resolve the base-case growth rate: override, then provider, then the
/// configured default.
pub fn growth_for(
    snapshot: &CompanyFinancials,
    config: &AnalysisConfig,
) -> (Rate, GrowthSource) {
    if let Some(g) = config.overrides.growth_rate {
        return (g, GrowthSource::Override);
    }
    match snapshot.growth_rate {
        Some(g) => (g, GrowthSource::Provider),
        None => (config.default_growth, GrowthSource::AssumedDefault),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run the full analysis, propagating fatal errors.
///
/// Fatal conditions are an invalid snapshot, an invalid configuration, or a
/// scenario whose WACC does not exceed its terminal growth. Missing data for
/// an individual metric never fails the run.
pub fn run_analysis(
    snapshot: &CompanyFinancials,
    config: &AnalysisConfig,
) -> EquityAnalyzerResult<ComputationOutput<AnalysisResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    config.validate()?;

    // -- Overrides -----------------------------------------------------------
    let (snap, override_notes) = config.overrides.apply(snapshot)?;
    snap.validate()?;
    debug!(ticker = %snap.ticker, overrides = override_notes.len(), "snapshot prepared");

    let consistency = snap.consistency_checks();
    for issue in &consistency {
        warn!(ticker = %snap.ticker, issue = %issue, "snapshot consistency");
    }
    warnings.extend(consistency.iter().cloned());

    let (growth_rate, growth_source) = growth_for(&snap, config);
    let mut dcf_notes = override_notes;
    if growth_source == GrowthSource::AssumedDefault {
        let note = format!(
            "Default growth rate used ({}%)",
            (growth_rate * dec!(100)).round_dp(2)
        );
        warnings.push(note.clone());
        dcf_notes.push(note);
    }

    // -- Valuation -----------------------------------------------------------
    let base = DcfAssumptions::new(config.wacc, growth_rate, config.terminal_growth);
    let projection = project(&snap, &base)?;
    if projection.is_none() {
        dcf_notes.push("DCF unavailable: free cash flow missing".to_string());
    }
    let base_value = projection.as_ref().map(|p| p.intrinsic_value_per_share);
    debug!(value = ?base_value, "base dcf evaluated");

    let (scenarios, scenario_warnings) = build_scenarios(&config.scenarios, &base)?;
    warnings.extend(scenario_warnings);
    let dcf_scenarios = aggregate(&snap, &scenarios)?;

    #[cfg(feature = "monte_carlo")]
    let monte_carlo = {
        let mc = monte_carlo::sample(&snap, &base, &config.monte_carlo)?;
        if let Some(r) = &mc {
            if r.skipped > 0 {
                warnings.push(format!(
                    "Monte Carlo: {} of {} iterations skipped",
                    r.skipped, r.iterations
                ));
            }
            if r.degraded {
                warnings.push(format!(
                    "Monte Carlo degraded: only {} of {} iterations succeeded",
                    r.successful, r.iterations
                ));
            }
        }
        mc
    };

    // -- Metrics and scoring -------------------------------------------------
    let (ratios, metrics) = compute_with_threshold(&snap, config.ratio_threshold);
    let scoring = compose(
        &snap,
        Some(&dcf_scenarios),
        &ratios,
        &metrics,
        &config.score_weights,
    )?;
    debug!(score_total = %scoring.score_total, "scores composed");

    let verdict = build_verdict(
        snap.price,
        dcf_scenarios.weighted_intrinsic_value,
        scoring.score_total,
        config.verdict_threshold,
    );
    let recommendation = build_recommendation(&snap, &verdict, &scoring);
    let summary = investor_summary(
        &snap,
        &ratios,
        dcf_scenarios.weighted_intrinsic_value,
        &scoring,
        &verdict,
    )
    .join("\n");

    // -- Assembly ------------------------------------------------------------
    let mut notes = missing_field_notes(&snap);
    notes.extend(consistency);

    let dcf = DcfSection {
        intrinsic_value_per_share: base_value,
        current_price: snap.price,
        wacc: base.wacc,
        growth_rate: base.growth_rate,
        terminal_growth: base.terminal_growth,
        comparison: describe_price_gap(snap.price, base_value),
        notes: dcf_notes,
        projection,
    };

    let result = AnalysisResult {
        ticker: snap.ticker.clone(),
        key_data: Some(key_data(&snap, growth_rate, growth_source, notes)),
        multiples_analysis: Some(ratios),
        dcf: Some(dcf),
        dcf_scenarios: Some(dcf_scenarios),
        #[cfg(feature = "monte_carlo")]
        monte_carlo,
        advanced_metrics: Some(metrics),
        scoring: Some(scoring),
        verdict_final: Some(verdict),
        resume_investisseur: Some(summary),
        recommandation: Some(recommendation),
        error: None,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario-weighted 5-year FCF DCF, Monte Carlo, multiples, Piotroski/Altman, pillar scoring",
        config,
        warnings,
        elapsed,
        result,
    ))
}

/// Run the full analysis; never fails.
///
/// A fatal error yields a result whose sections are all absent and whose
/// `error` holds the message.
pub fn analyze(snapshot: &CompanyFinancials, config: &AnalysisConfig) -> AnalysisResult {
    match run_analysis(snapshot, config) {
        Ok(out) => out.result,
        Err(e) => {
            warn!(ticker = %snapshot.ticker, error = %e, "analysis failed");
            AnalysisResult::failed(&snapshot.ticker, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_gap_descriptions() {
        assert_eq!(
            describe_price_gap(Some(dec!(120)), Some(dec!(100))),
            "Stock overvalued by 20.0%"
        );
        assert_eq!(
            describe_price_gap(Some(dec!(80)), Some(dec!(100))),
            "Stock undervalued by 20.0%"
        );
        assert_eq!(
            describe_price_gap(Some(dec!(100.5)), Some(dec!(100))),
            "Price aligned with intrinsic value"
        );
        assert_eq!(
            describe_price_gap(None, Some(dec!(100))),
            "Comparison unavailable (missing data)"
        );
    }

    #[test]
    fn test_growth_source_precedence() {
        let mut snap = CompanyFinancials {
            ticker: "G".into(),
            shares_outstanding: dec!(1),
            ..Default::default()
        };
        let mut config = AnalysisConfig::default();
        assert_eq!(growth_for(&snap, &config), (dec!(0.05), GrowthSource::AssumedDefault));
        snap.growth_rate = Some(dec!(0.07));
        assert_eq!(growth_for(&snap, &config), (dec!(0.07), GrowthSource::Provider));
        config.overrides.growth_rate = Some(dec!(0.09));
        assert_eq!(growth_for(&snap, &config), (dec!(0.09), GrowthSource::Override));
    }

    #[test]
    fn test_missing_field_notes() {
        let snap = CompanyFinancials {
            ticker: "N".into(),
            shares_outstanding: dec!(1),
            price: Some(dec!(10)),
            ..Default::default()
        };
        let notes = missing_field_notes(&snap);
        assert_eq!(notes.len(), 9);
        assert!(notes.contains(&"Free cash flow missing".to_string()));
    }

    #[test]
    fn test_failed_result_has_no_sections() {
        let r = AnalysisResult::failed("X", "boom".into());
        assert!(r.is_error());
        assert!(r.scoring.is_none() && r.dcf.is_none() && r.key_data.is_none());
    }
}
