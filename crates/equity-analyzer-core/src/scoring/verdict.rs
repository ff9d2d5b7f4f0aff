use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::composer::{Pillar, ScoringSection};
use crate::metrics::RatioRow;
use crate::snapshot::CompanyFinancials;
use crate::types::{ratio, Money, Rate, Score};

/// Default gap between intrinsic value and price that flips the verdict.
pub const DEFAULT_VERDICT_THRESHOLD: Rate = dec!(0.10);

const STRONG_BUY_SCORE: Score = dec!(70);
const STRONG_SELL_SCORE: Score = dec!(45);

const MAX_BULLETS: usize = 4;
const MAX_EXPLANATION_SENTENCES: usize = 3;
const MAX_SUMMARY_LINES: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictState {
    Undervalued,
    Overvalued,
    Neutral,
    InsufficientData,
}

impl std::fmt::Display for VerdictState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undervalued => write!(f, "Undervalued"),
            Self::Overvalued => write!(f, "Overvalued"),
            Self::Neutral => write!(f, "Neutral"),
            Self::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictSection {
    pub state: VerdictState,
    /// (intrinsic - price) / price, when both are known and it is in range
    pub gap: Option<Rate>,
    pub explanation: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "Strong Buy"),
            Self::Buy => write!(f, "Buy"),
            Self::Hold => write!(f, "Hold"),
            Self::Sell => write!(f, "Sell"),
            Self::StrongSell => write!(f, "Strong Sell"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSection {
    pub signal: Signal,
    pub horizon: String,
    pub catalysts: Vec<String>,
    pub risks: Vec<String>,
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Classify price against intrinsic value.
///
/// Missing intrinsic value, or a missing or non-positive price, is
/// `InsufficientData`.
pub fn classify_verdict(
    price: Option<Money>,
    intrinsic: Option<Money>,
    threshold: Rate,
) -> (VerdictState, Option<Rate>) {
    let (price, intrinsic) = match (price, intrinsic) {
        (Some(p), Some(i)) if p > Decimal::ZERO => (p, i),
        _ => return (VerdictState::InsufficientData, None),
    };
    let gap = intrinsic.checked_sub(price).and_then(|diff| diff.checked_div(price));
    let state = match gap {
        Some(g) if g >= threshold => VerdictState::Undervalued,
        Some(g) if g <= -threshold => VerdictState::Overvalued,
        Some(_) => VerdictState::Neutral,
        // A gap beyond Decimal range is far outside any threshold
        None if intrinsic > price => VerdictState::Undervalued,
        None => VerdictState::Overvalued,
    };
    (state, gap)
}

/// Keep at most `max` sentences.
fn limit_sentences(text: &str, max: usize) -> String {
    let mut out = String::new();
    let mut count = 0;
    for sentence in text.split_inclusive(". ") {
        if count == max {
            break;
        }
        out.push_str(sentence);
        count += 1;
    }
    out.trim().to_string()
}

fn pct(v: Decimal) -> String {
    match v.checked_mul(dec!(100)) {
        Some(p) => format!("{:.1}%", p.abs()),
        None => "over 100000%".to_string(),
    }
}

fn amount(v: Option<Decimal>) -> String {
    v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "N/A".to_string())
}

pub fn build_verdict(
    price: Option<Money>,
    intrinsic: Option<Money>,
    score_total: Score,
    threshold: Rate,
) -> VerdictSection {
    let (state, gap) = classify_verdict(price, intrinsic, threshold);
    let score = format!("{:.1}", score_total);

    let explanation = match (state, gap) {
        (VerdictState::Undervalued, Some(g)) => format!(
            "Estimated intrinsic value ({}) is {} above the current price ({}). Composite score {}/100.",
            amount(intrinsic),
            pct(g),
            amount(price),
            score
        ),
        (VerdictState::Overvalued, Some(g)) => format!(
            "Current price ({}) exceeds the estimated intrinsic value ({}) by a {} gap. Composite score {}/100.",
            amount(price),
            amount(intrinsic),
            pct(g),
            score
        ),
        (VerdictState::Undervalued, None) => format!(
            "Estimated intrinsic value ({}) is far above the current price ({}). Composite score {}/100.",
            amount(intrinsic),
            amount(price),
            score
        ),
        (VerdictState::Overvalued, None) => format!(
            "Current price ({}) is far above the estimated intrinsic value ({}). Composite score {}/100.",
            amount(price),
            amount(intrinsic),
            score
        ),
        (VerdictState::Neutral, Some(g)) => format!(
            "Price is close to the estimated intrinsic value ({} gap). Composite score {}/100.",
            pct(g),
            score
        ),
        _ => format!(
            "DCF valuation unavailable (missing free cash flow or price). Judgement rests on the composite score alone ({}/100).",
            score
        ),
    };

    VerdictSection {
        state,
        gap,
        explanation: limit_sentences(&explanation, MAX_EXPLANATION_SENTENCES),
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

pub fn signal_for(state: VerdictState, score_total: Score) -> Signal {
    match state {
        VerdictState::Undervalued if score_total >= STRONG_BUY_SCORE => Signal::StrongBuy,
        VerdictState::Undervalued => Signal::Buy,
        VerdictState::Overvalued if score_total <= STRONG_SELL_SCORE => Signal::StrongSell,
        VerdictState::Overvalued => Signal::Sell,
        VerdictState::Neutral | VerdictState::InsufficientData => Signal::Hold,
    }
}

pub fn horizon_for(state: VerdictState) -> &'static str {
    match state {
        VerdictState::Undervalued => "Long term (3+ years)",
        VerdictState::Overvalued => "Short to medium term (up to 1 year)",
        VerdictState::Neutral => "Medium term (12-24 months)",
        VerdictState::InsufficientData => "Undetermined until valuation data is available",
    }
}

fn catalyst_driver(pillar: Pillar) -> &'static str {
    match pillar {
        Pillar::FinancialHealth => "Solid balance sheet and returns on capital support reinvestment",
        Pillar::Growth => "Strong expected growth trajectory",
        Pillar::Valuation => "Attractive valuation versus intrinsic value and sector multiples",
        Pillar::Risk => "Low risk profile (beta and leverage below peers)",
    }
}

fn risk_driver(pillar: Pillar) -> &'static str {
    match pillar {
        Pillar::FinancialHealth => "Weak financial health (returns, margins or leverage)",
        Pillar::Growth => "Limited growth visibility",
        Pillar::Valuation => "Demanding valuation leaves little margin of safety",
        Pillar::Risk => "Elevated risk profile (beta or leverage above peers)",
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|x| x == item) {
        list.push(item.to_string());
    }
}

pub fn catalysts(snapshot: &CompanyFinancials, scoring: &ScoringSection) -> Vec<String> {
    let mut out = Vec::new();
    push_unique(&mut out, catalyst_driver(scoring.strongest()));

    if snapshot.growth_rate.is_some_and(|g| g > dec!(0.10)) {
        push_unique(&mut out, "Strong organic growth potential (above 10% a year)");
    }
    let pays_out = snapshot.dividend_per_share.is_some_and(|d| d > Decimal::ZERO);
    if snapshot.free_cash_flow.is_some_and(|f| f > Decimal::ZERO) && pays_out {
        push_unique(&mut out, "Attractive cash returns (dividends or buybacks)");
    }
    if snapshot.net_debt().is_some_and(|d| d < Decimal::ZERO) {
        push_unique(&mut out, "Net cash balance sheet allows opportunistic acquisitions");
    }
    push_unique(
        &mut out,
        "Strategic initiatives: product innovation, geographic expansion or margin gains",
    );

    out.truncate(MAX_BULLETS);
    out
}

pub fn risks(snapshot: &CompanyFinancials, scoring: &ScoringSection) -> Vec<String> {
    let mut out = Vec::new();
    push_unique(&mut out, risk_driver(scoring.weakest()));

    if snapshot.growth_rate.map_or(true, |g| g < dec!(0.03)) {
        push_unique(&mut out, "Limited revenue growth visibility (below 3% or unknown)");
    }
    let leverage = snapshot
        .ebitda
        .filter(|e| *e > Decimal::ZERO)
        .zip(snapshot.net_debt())
        .and_then(|(e, d)| ratio(d, e));
    if leverage.is_some_and(|l| l > dec!(3)) {
        push_unique(&mut out, "High financial leverage (net debt / EBITDA above 3x)");
    }
    if snapshot.free_cash_flow.map_or(true, |f| f < Decimal::ZERO) {
        push_unique(&mut out, "Fragile or negative free cash flow");
    }
    if snapshot.beta.is_some_and(|b| b >= dec!(1.5)) {
        push_unique(&mut out, "Beta and volatility above peers");
    }
    push_unique(
        &mut out,
        "Sensitivity to macroeconomic cycles and sector regulation",
    );

    out.truncate(MAX_BULLETS);
    out
}

pub fn build_recommendation(
    snapshot: &CompanyFinancials,
    verdict: &VerdictSection,
    scoring: &ScoringSection,
) -> RecommendationSection {
    RecommendationSection {
        signal: signal_for(verdict.state, scoring.score_total),
        horizon: horizon_for(verdict.state).to_string(),
        catalysts: catalysts(snapshot, scoring),
        risks: risks(snapshot, scoring),
    }
}

// ---------------------------------------------------------------------------
// Investor summary
// ---------------------------------------------------------------------------

fn percent_or_na(v: Option<Rate>) -> String {
    v.and_then(|x| x.checked_mul(dec!(100)))
        .map(|x| format!("{:.1}%", x))
        .unwrap_or_else(|| "N/A".to_string())
}

/// Short plain-text synthesis, at most ten lines.
pub fn investor_summary(
    snapshot: &CompanyFinancials,
    ratios: &[RatioRow],
    weighted_intrinsic: Option<Money>,
    scoring: &ScoringSection,
    verdict: &VerdictSection,
) -> Vec<String> {
    let currency = snapshot
        .currency
        .as_deref()
        .map(|c| format!(" {c}"))
        .unwrap_or_default();
    let with_ccy = |v: Option<Decimal>| match v {
        Some(x) => format!("{:.2}{}", x, currency),
        None => "N/A".to_string(),
    };

    let mut lines = Vec::new();
    lines.push(format!(
        "{} ({}) - sector {} / industry {}.",
        snapshot.name.as_deref().unwrap_or(&snapshot.ticker),
        snapshot.ticker,
        snapshot.sector.as_deref().unwrap_or("N/A"),
        snapshot.industry.as_deref().unwrap_or("N/A"),
    ));
    lines.push(format!("Current price: {}.", with_ccy(snapshot.price)));
    lines.push(format!(
        "Expected growth: {}; return on equity: {}.",
        percent_or_na(snapshot.growth_rate),
        percent_or_na(snapshot.roe)
    ));
    for name in ["P/E", "P/S"] {
        if let Some(r) = ratios.iter().find(|r| r.name == name) {
            lines.push(format!(
                "{} {} vs sector {} ({}).",
                name,
                amount(r.value),
                amount(r.sector),
                r.verdict
            ));
        }
    }
    lines.push(format!(
        "Free cash flow used in the DCF: {}.",
        with_ccy(snapshot.free_cash_flow)
    ));
    if weighted_intrinsic.is_some() {
        lines.push(format!(
            "Scenario-weighted intrinsic value: {}.",
            with_ccy(weighted_intrinsic)
        ));
    }
    lines.push(format!("Net debt: {}.", with_ccy(snapshot.net_debt())));
    lines.push(format!(
        "Scores: health {:.0}, growth {:.0}, valuation {:.0}, risk {:.0}; total {:.1}/100.",
        scoring.financial_health, scoring.growth, scoring.valuation, scoring.risk, scoring.score_total
    ));
    lines.push(format!("Verdict: {}.", verdict.state));

    lines.truncate(MAX_SUMMARY_LINES);
    lines
}
