use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquityAnalyzerError;
use crate::metrics::{AdvancedMetrics, RatioRow, RatioVerdict, ZScoreZone};
use crate::snapshot::CompanyFinancials;
use crate::types::{clamp_score, ratio, saturating_gap, Rate, Score};
use crate::valuation::DcfScenarioBlock;
use crate::EquityAnalyzerResult;

/// Pillar value when none of its sub-signals is available.
pub const NEUTRAL_SCORE: Score = dec!(50);

// Growth is mapped linearly from this band onto [0, 100]
const GROWTH_FLOOR: Rate = dec!(-0.05);
const GROWTH_CEILING: Rate = dec!(0.20);

// Price gap is mapped linearly from [-50%, +50%] onto [0, 100]
const GAP_BAND: Rate = dec!(0.50);

const VALUATION_GAP_WEIGHT: Decimal = dec!(0.7);
const VALUATION_MULTIPLES_WEIGHT: Decimal = dec!(0.3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Relative weight of each pillar in `score_total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub financial_health: Decimal,
    pub growth: Decimal,
    pub valuation: Decimal,
    pub risk: Decimal,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            financial_health: dec!(0.25),
            growth: dec!(0.25),
            valuation: dec!(0.25),
            risk: dec!(0.25),
        }
    }
}

impl ScoreWeights {
    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        let named = [
            ("financial_health", self.financial_health),
            ("growth", self.growth),
            ("valuation", self.valuation),
            ("risk", self.risk),
        ];
        for (name, w) in named {
            if w < Decimal::ZERO {
                return Err(EquityAnalyzerError::InvalidInput {
                    field: format!("score_weights.{name}"),
                    reason: format!("Weight must be non-negative (got {w})"),
                });
            }
        }
        if self.total().is_zero() {
            return Err(EquityAnalyzerError::InvalidInput {
                field: "score_weights".into(),
                reason: "At least one pillar weight must be positive".into(),
            });
        }
        Ok(())
    }

    fn total(&self) -> Decimal {
        self.financial_health + self.growth + self.valuation + self.risk
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringSection {
    pub financial_health: Score,
    pub growth: Score,
    pub valuation: Score,
    pub risk: Score,
    pub score_total: Score,
}

/// The four scoring pillars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    FinancialHealth,
    Growth,
    Valuation,
    Risk,
}

impl ScoringSection {
    pub fn pillars(&self) -> [(Pillar, Score); 4] {
        [
            (Pillar::FinancialHealth, self.financial_health),
            (Pillar::Growth, self.growth),
            (Pillar::Valuation, self.valuation),
            (Pillar::Risk, self.risk),
        ]
    }

    /// Highest pillar; ties go to the earlier pillar.
    pub fn strongest(&self) -> Pillar {
        let mut best = self.pillars()[0];
        for p in self.pillars() {
            if p.1 > best.1 {
                best = p;
            }
        }
        best.0
    }

    /// Lowest pillar; ties go to the earlier pillar.
    pub fn weakest(&self) -> Pillar {
        let mut worst = self.pillars()[0];
        for p in self.pillars() {
            if p.1 < worst.1 {
                worst = p;
            }
        }
        worst.0
    }
}

// ---------------------------------------------------------------------------
// Sub-signal bands
// ---------------------------------------------------------------------------

/// Weighted mean over the available sub-signals, renormalizing the weights.
fn basket(signals: &[(Option<Score>, Decimal)]) -> Option<Score> {
    let (sum, weight) = signals
        .iter()
        .filter_map(|(s, w)| s.map(|s| (s * w, *w)))
        .fold((Decimal::ZERO, Decimal::ZERO), |(a, b), (s, w)| (a + s, b + w));
    ratio(sum, weight)
}

/// Map `value` onto 0-100 across `[low, high]`. Values too extreme for
/// Decimal arithmetic saturate at the nearer end of the band.
fn linear(value: Decimal, low: Decimal, high: Decimal) -> Score {
    let scaled = value
        .checked_sub(low)
        .and_then(|offset| ratio(offset, high - low))
        .and_then(|share| share.checked_mul(dec!(100)));
    match scaled {
        Some(s) => clamp_score(s),
        None if value > high => Decimal::ONE_HUNDRED,
        None => Decimal::ZERO,
    }
}

fn roic_band(roic: Rate) -> Score {
    if roic >= dec!(0.15) {
        dec!(90)
    } else if roic >= dec!(0.10) {
        dec!(75)
    } else if roic >= dec!(0.05) {
        dec!(60)
    } else if roic >= Decimal::ZERO {
        dec!(45)
    } else {
        dec!(25)
    }
}

fn margin_band(margin: Rate) -> Score {
    if margin >= dec!(0.20) {
        dec!(90)
    } else if margin >= dec!(0.10) {
        dec!(75)
    } else if margin >= dec!(0.05) {
        dec!(60)
    } else if margin >= Decimal::ZERO {
        dec!(45)
    } else {
        dec!(25)
    }
}

/// Net debt / equity.
fn leverage_band(debt_to_equity: Decimal) -> Score {
    if debt_to_equity < Decimal::ZERO {
        dec!(90)
    } else if debt_to_equity < dec!(0.2) {
        dec!(80)
    } else if debt_to_equity < dec!(0.5) {
        dec!(70)
    } else if debt_to_equity < Decimal::ONE {
        dec!(55)
    } else {
        dec!(40)
    }
}

fn altman_band(zone: ZScoreZone) -> Score {
    match zone {
        ZScoreZone::Safe => dec!(85),
        ZScoreZone::Grey => dec!(55),
        ZScoreZone::Distress => dec!(20),
    }
}

fn beta_band(beta: Decimal) -> Score {
    if beta < dec!(0.8) {
        dec!(85)
    } else if beta < dec!(1.1) {
        dec!(70)
    } else if beta < dec!(1.5) {
        dec!(55)
    } else {
        dec!(40)
    }
}

/// Net debt / EBITDA.
fn debt_ebitda_band(multiple: Decimal) -> Score {
    if multiple < Decimal::ONE {
        dec!(85)
    } else if multiple < dec!(2) {
        dec!(70)
    } else if multiple <= dec!(3) {
        dec!(55)
    } else {
        dec!(30)
    }
}

fn verdict_points(verdict: RatioVerdict) -> Option<Score> {
    match verdict {
        RatioVerdict::Undervalued => Some(dec!(90)),
        RatioVerdict::InLine => Some(dec!(60)),
        RatioVerdict::Overvalued => Some(dec!(30)),
        RatioVerdict::InsufficientData => None,
    }
}

fn net_debt_to_ebitda(snapshot: &CompanyFinancials) -> Option<Decimal> {
    let ebitda = snapshot.ebitda.filter(|e| *e > Decimal::ZERO)?;
    ratio(snapshot.net_debt()?, ebitda)
}

// ---------------------------------------------------------------------------
// Pillars
// ---------------------------------------------------------------------------

pub fn financial_health_score(snapshot: &CompanyFinancials, metrics: &AdvancedMetrics) -> Score {
    let leverage = snapshot
        .total_equity()
        .filter(|e| *e > Decimal::ZERO)
        .zip(snapshot.net_debt())
        .and_then(|(equity, debt)| ratio(debt, equity));
    let piotroski = (metrics.piotroski.evaluated > 0)
        .then(|| Decimal::from(metrics.piotroski_score) / dec!(9) * dec!(100));

    let base = basket(&[
        (metrics.roic.map(roic_band), dec!(0.25)),
        (
            metrics
                .operating_margin
                .or_else(|| snapshot.net_margin())
                .map(margin_band),
            dec!(0.20),
        ),
        (leverage.map(leverage_band), dec!(0.25)),
        (piotroski, dec!(0.15)),
        (metrics.altman_zone.map(altman_band), dec!(0.15)),
    ])
    .unwrap_or(NEUTRAL_SCORE);

    let adjustment = match snapshot.payout_ratio {
        Some(p) if p < dec!(0.5) => dec!(5),
        Some(p) if p > dec!(0.9) => dec!(-10),
        _ => Decimal::ZERO,
    };
    clamp_score(base + adjustment)
}

pub fn growth_score(snapshot: &CompanyFinancials) -> Score {
    snapshot
        .growth_rate
        .map(|g| linear(g, GROWTH_FLOOR, GROWTH_CEILING))
        .unwrap_or(NEUTRAL_SCORE)
}

pub fn valuation_score(
    snapshot: &CompanyFinancials,
    dcf_block: Option<&DcfScenarioBlock>,
    ratios: &[RatioRow],
) -> Score {
    let gap = match (
        dcf_block.and_then(|b| b.weighted_intrinsic_value),
        snapshot.price.filter(|p| *p > Decimal::ZERO),
    ) {
        (Some(intrinsic), Some(price)) => Some(saturating_gap(intrinsic, price)),
        _ => None,
    };
    let gap_score = gap.map(|g| linear(g, -GAP_BAND, GAP_BAND));

    let points: Vec<Score> = ratios.iter().filter_map(|r| verdict_points(r.verdict)).collect();
    let multiples_score = ratio(points.iter().copied().sum(), Decimal::from(points.len()));

    clamp_score(
        basket(&[
            (gap_score, VALUATION_GAP_WEIGHT),
            (multiples_score, VALUATION_MULTIPLES_WEIGHT),
        ])
        .unwrap_or(NEUTRAL_SCORE),
    )
}

pub fn risk_score(snapshot: &CompanyFinancials, metrics: &AdvancedMetrics) -> Score {
    clamp_score(
        basket(&[
            (snapshot.beta.map(beta_band), dec!(0.40)),
            (net_debt_to_ebitda(snapshot).map(debt_ebitda_band), dec!(0.35)),
            (metrics.altman_zone.map(altman_band), dec!(0.25)),
        ])
        .unwrap_or(NEUTRAL_SCORE),
    )
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the four pillar scores and the weighted composite.
///
/// Missing sub-signals are dropped and the rest renormalized; a pillar with
/// nothing to go on is the neutral 50, so `score_total` is always defined.
pub fn compose(
    snapshot: &CompanyFinancials,
    dcf_block: Option<&DcfScenarioBlock>,
    ratios: &[RatioRow],
    metrics: &AdvancedMetrics,
    weights: &ScoreWeights,
) -> EquityAnalyzerResult<ScoringSection> {
    weights.validate()?;

    let financial_health = financial_health_score(snapshot, metrics);
    let growth = growth_score(snapshot);
    let valuation = valuation_score(snapshot, dcf_block, ratios);
    let risk = risk_score(snapshot, metrics);

    let weighted = financial_health * weights.financial_health
        + growth * weights.growth
        + valuation * weights.valuation
        + risk * weights.risk;
    let score_total = clamp_score(weighted / weights.total());

    Ok(ScoringSection {
        financial_health,
        growth,
        valuation,
        risk,
        score_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::compute;
    use crate::valuation::ScenarioResult;

    fn empty_snapshot() -> CompanyFinancials {
        CompanyFinancials {
            ticker: "VOID".into(),
            shares_outstanding: dec!(1),
            ..Default::default()
        }
    }

    fn block(value: Option<Decimal>) -> DcfScenarioBlock {
        DcfScenarioBlock {
            scenarios: vec![ScenarioResult {
                scenario: "Base".into(),
                intrinsic_value: value,
                wacc: dec!(0.08),
                growth_rate: dec!(0.05),
                terminal_growth: dec!(0.025),
                weight: Decimal::ONE,
            }],
            weighted_intrinsic_value: value,
        }
    }

    #[test]
    fn test_all_missing_is_neutral() {
        let snap = empty_snapshot();
        let (ratios, metrics) = compute(&snap);
        let s = compose(&snap, None, &ratios, &metrics, &ScoreWeights::default()).unwrap();
        assert_eq!(s.financial_health, NEUTRAL_SCORE);
        assert_eq!(s.growth, NEUTRAL_SCORE);
        assert_eq!(s.valuation, NEUTRAL_SCORE);
        assert_eq!(s.risk, NEUTRAL_SCORE);
        assert_eq!(s.score_total, NEUTRAL_SCORE);
    }

    #[test]
    fn test_growth_band_mapping() {
        let mut snap = empty_snapshot();
        snap.growth_rate = Some(dec!(0.075));
        assert_eq!(growth_score(&snap), dec!(50));
        snap.growth_rate = Some(dec!(0.35));
        assert_eq!(growth_score(&snap), dec!(100));
        snap.growth_rate = Some(dec!(-0.10));
        assert_eq!(growth_score(&snap), Decimal::ZERO);
    }

    #[test]
    fn test_valuation_gap_only() {
        let mut snap = empty_snapshot();
        snap.price = Some(dec!(100));
        // +25% gap → 75, no multiples with data
        let ratios = Vec::new();
        assert_eq!(valuation_score(&snap, Some(&block(Some(dec!(125)))), &ratios), dec!(75));
        // Beyond the band clamps
        assert_eq!(valuation_score(&snap, Some(&block(Some(dec!(300)))), &ratios), dec!(100));
    }

    #[test]
    fn test_payout_adjustment() {
        let mut snap = empty_snapshot();
        let (_, metrics) = compute(&snap);
        snap.payout_ratio = Some(dec!(0.95));
        assert_eq!(financial_health_score(&snap, &metrics), dec!(40));
        snap.payout_ratio = Some(dec!(0.30));
        assert_eq!(financial_health_score(&snap, &metrics), dec!(55));
    }

    #[test]
    fn test_risk_uses_beta_and_leverage() {
        let mut snap = empty_snapshot();
        snap.beta = Some(dec!(0.7));
        snap.net_debt = Some(dec!(50));
        snap.ebitda = Some(dec!(100));
        let (_, metrics) = compute(&snap);
        // Both bands at 85
        assert_eq!(risk_score(&snap, &metrics), dec!(85));
        snap.beta = Some(dec!(2.0));
        snap.net_debt = Some(dec!(500));
        assert!(risk_score(&snap, &metrics) < dec!(40));
    }

    #[test]
    fn test_custom_weights() {
        let mut snap = empty_snapshot();
        snap.growth_rate = Some(dec!(0.20));
        let (ratios, metrics) = compute(&snap);
        let weights = ScoreWeights {
            financial_health: Decimal::ZERO,
            growth: Decimal::ONE,
            valuation: Decimal::ZERO,
            risk: Decimal::ZERO,
        };
        let s = compose(&snap, None, &ratios, &metrics, &weights).unwrap();
        assert_eq!(s.score_total, dec!(100));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let snap = empty_snapshot();
        let (ratios, metrics) = compute(&snap);
        let zero = ScoreWeights {
            financial_health: Decimal::ZERO,
            growth: Decimal::ZERO,
            valuation: Decimal::ZERO,
            risk: Decimal::ZERO,
        };
        assert!(compose(&snap, None, &ratios, &metrics, &zero).is_err());
        let negative = ScoreWeights {
            risk: dec!(-0.25),
            ..Default::default()
        };
        assert!(compose(&snap, None, &ratios, &metrics, &negative).is_err());
    }

    #[test]
    fn test_score_total_bounded_for_extremes() {
        let mut snap = empty_snapshot();
        snap.growth_rate = Some(dec!(4));
        snap.price = Some(dec!(1));
        snap.payout_ratio = Some(dec!(0.1));
        snap.beta = Some(dec!(-3));
        let (ratios, metrics) = compute(&snap);
        let s = compose(&snap, Some(&block(Some(dec!(1000000)))), &ratios, &metrics, &ScoreWeights::default())
            .unwrap();
        for (_, p) in s.pillars() {
            assert!(p >= Decimal::ZERO && p <= dec!(100));
        }
        assert!(s.score_total >= Decimal::ZERO && s.score_total <= dec!(100));
    }

    #[test]
    fn test_linear_saturates_instead_of_overflowing() {
        assert_eq!(linear(Decimal::MAX, dec!(-0.1), dec!(0.25)), dec!(100));
        assert_eq!(linear(Decimal::MIN, dec!(-0.1), dec!(0.25)), Decimal::ZERO);
        assert_eq!(linear(dec!(0.075), dec!(-0.1), dec!(0.25)), dec!(50));
    }

    #[test]
    fn test_huge_gap_and_growth_do_not_panic() {
        let mut snap = empty_snapshot();
        snap.growth_rate = Some(Decimal::MAX);
        snap.price = Some(dec!(0.0000000001));
        let (ratios, metrics) = compute(&snap);
        let huge = block(Some(dec!(70000000000000000000000000000)));
        let s = compose(&snap, Some(&huge), &ratios, &metrics, &ScoreWeights::default()).unwrap();
        assert_eq!(s.growth, dec!(100));
        assert_eq!(s.valuation, dec!(100));
        assert!(s.score_total <= dec!(100));
    }

    #[test]
    fn test_strongest_and_weakest() {
        let s = ScoringSection {
            financial_health: dec!(60),
            growth: dec!(80),
            valuation: dec!(30),
            risk: dec!(30),
            score_total: dec!(50),
        };
        assert_eq!(s.strongest(), Pillar::Growth);
        assert_eq!(s.weakest(), Pillar::Valuation);
    }
}
