use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Normal, Triangular, Uniform};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::EquityAnalyzerError;
use crate::snapshot::CompanyFinancials;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::valuation::dcf::{project_cash_flows, DcfAssumptions};
use crate::EquityAnalyzerResult;

/// Normal draws are truncated at this many standard deviations.
const NORMAL_TRUNCATION_SIGMAS: f64 = 3.0;

/// Rejection attempts before a Normal draw is clamped to the truncation bound.
const NORMAL_REJECTION_LIMIT: u32 = 32;

const MAX_ITERATIONS: u32 = 1_000_000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Spread around a centre value. Parameters are offsets, not absolute levels,
/// so the same spec can be reused for any base case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpreadDistribution {
    /// Always the centre value
    Fixed,
    /// Normal(centre, std_dev) truncated at 3 standard deviations
    Normal { std_dev: f64 },
    /// Triangular with mode at the centre; `lower` <= 0 <= `upper`
    Triangular { lower: f64, upper: f64 },
    /// Uniform on [centre - half_width, centre + half_width]
    Uniform { half_width: f64 },
}

/// One sampled variable: its spread plus optional absolute bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McVariableSpec {
    pub distribution: SpreadDistribution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<Rate>,
}

impl McVariableSpec {
    pub fn fixed() -> Self {
        Self {
            distribution: SpreadDistribution::Fixed,
            floor: None,
            cap: None,
        }
    }

    pub fn normal(std_dev: f64) -> Self {
        Self {
            distribution: SpreadDistribution::Normal { std_dev },
            floor: None,
            cap: None,
        }
    }

    pub fn with_floor(mut self, floor: Rate) -> Self {
        self.floor = Some(floor);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McDistributions {
    pub growth: McVariableSpec,
    /// Offsets are fractions of the base net margin (0.1 = +/-10% of it);
    /// floor and cap stay absolute margin levels.
    pub margin: McVariableSpec,
    pub wacc: McVariableSpec,
}

impl Default for McDistributions {
    /// Growth +/- 2pp, margin +/- 10% of its base, WACC +/- 1pp floored at 2%.
    fn default() -> Self {
        Self {
            growth: McVariableSpec::normal(0.02),
            margin: McVariableSpec::normal(0.10),
            wacc: McVariableSpec::normal(0.01).with_floor(dec!(0.02)),
        }
    }
}

impl McDistributions {
    /// Every variable pinned to its base value.
    pub fn zero_variance() -> Self {
        Self {
            growth: McVariableSpec::fixed(),
            margin: McVariableSpec::fixed(),
            wacc: McVariableSpec::fixed(),
        }
    }
}

/// How terminal growth is set for each draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TerminalGrowthPolicy {
    /// Held at the base-case terminal growth
    #[default]
    Fixed,
    /// `fraction * drawn WACC`
    FractionOfWacc { fraction: Decimal },
    /// `fraction * drawn growth`, floored at zero
    FractionOfGrowth { fraction: Decimal },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub iterations: u32,
    pub seed: Option<u64>,
    pub distributions: McDistributions,
    pub terminal_policy: TerminalGrowthPolicy,
    /// Redraws allowed per iteration before it is skipped
    pub max_redraws: u32,
    /// Below this share of successful iterations the result is flagged degraded
    pub min_success_rate: Decimal,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: None,
            distributions: McDistributions::default(),
            terminal_policy: TerminalGrowthPolicy::Fixed,
            max_redraws: 10,
            min_success_rate: dec!(0.5),
        }
    }
}

impl MonteCarloConfig {
    pub fn validate(&self) -> EquityAnalyzerResult<()> {
        if self.iterations < 1 || self.iterations > MAX_ITERATIONS {
            return Err(EquityAnalyzerError::InvalidInput {
                field: "monte_carlo.iterations".into(),
                reason: format!("Must be between 1 and {MAX_ITERATIONS}"),
            });
        }
        if self.min_success_rate < Decimal::ZERO || self.min_success_rate > Decimal::ONE {
            return Err(EquityAnalyzerError::InvalidInput {
                field: "monte_carlo.min_success_rate".into(),
                reason: "Must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

/// Summary of the simulated intrinsic-value distribution. Per-iteration
/// values are not retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloResult {
    pub iterations: u32,
    pub successful: u32,
    pub skipped: u32,
    pub median: Option<Money>,
    pub min: Option<Money>,
    pub max: Option<Money>,
    pub mean: Option<Money>,
    pub p5: Option<Money>,
    pub p95: Option<Money>,
    /// True when the success rate fell below the configured floor
    pub degraded: bool,
}

// ---------------------------------------------------------------------------
// Sampling helpers
// ---------------------------------------------------------------------------

/// A validated, ready-to-draw offset distribution.
enum OffsetSampler {
    Zero,
    Normal { dist: Normal, bound: f64 },
    Triangular(Triangular),
    Uniform(Uniform),
}

impl OffsetSampler {
    fn build(spec: &SpreadDistribution, name: &str) -> EquityAnalyzerResult<Self> {
        let invalid = |reason: String| EquityAnalyzerError::InvalidInput {
            field: format!("monte_carlo.distributions.{name}"),
            reason,
        };
        match spec {
            SpreadDistribution::Fixed => Ok(Self::Zero),
            SpreadDistribution::Normal { std_dev } => {
                if *std_dev == 0.0 {
                    return Ok(Self::Zero);
                }
                let dist = Normal::new(0.0, *std_dev)
                    .map_err(|e| invalid(format!("Invalid Normal parameters: {e}")))?;
                Ok(Self::Normal {
                    dist,
                    bound: NORMAL_TRUNCATION_SIGMAS * std_dev,
                })
            }
            SpreadDistribution::Triangular { lower, upper } => {
                if *lower == 0.0 && *upper == 0.0 {
                    return Ok(Self::Zero);
                }
                if *lower > 0.0 || *upper < 0.0 {
                    return Err(invalid("Triangular bounds must straddle zero".into()));
                }
                let t = Triangular::new(*lower, *upper, 0.0)
                    .map_err(|e| invalid(format!("Invalid Triangular parameters: {e}")))?;
                Ok(Self::Triangular(t))
            }
            SpreadDistribution::Uniform { half_width } => {
                if *half_width == 0.0 {
                    return Ok(Self::Zero);
                }
                if !half_width.is_finite() || *half_width < 0.0 {
                    return Err(invalid("Uniform half width must be non-negative".into()));
                }
                let u = Uniform::new(-half_width, *half_width)
                    .map_err(|e| invalid(format!("Invalid Uniform parameters: {e}")))?;
                Ok(Self::Uniform(u))
            }
        }
    }

    fn draw(&self, rng: &mut StdRng) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::Normal { dist, bound } => {
                for _ in 0..NORMAL_REJECTION_LIMIT {
                    let x: f64 = rng.sample(dist);
                    if x.abs() <= *bound {
                        return x;
                    }
                }
                let x: f64 = rng.sample(dist);
                x.clamp(-bound, *bound)
            }
            Self::Triangular(t) => rng.sample(t),
            Self::Uniform(u) => rng.sample(u),
        }
    }
}

struct VariableSampler {
    offsets: OffsetSampler,
    floor: Option<Rate>,
    cap: Option<Rate>,
}

impl VariableSampler {
    fn build(spec: &McVariableSpec, name: &str) -> EquityAnalyzerResult<Self> {
        Ok(Self {
            offsets: OffsetSampler::build(&spec.distribution, name)?,
            floor: spec.floor,
            cap: spec.cap,
        })
    }

    /// Draw around `centre`. A zero offset returns `centre` unchanged so a
    /// fixed variable reproduces the base case exactly.
    fn draw(&self, rng: &mut StdRng, centre: Decimal) -> Decimal {
        let offset = self.offsets.draw(rng);
        let value = if offset == 0.0 {
            centre
        } else {
            centre + Decimal::from_f64(offset).unwrap_or(Decimal::ZERO)
        };
        self.bound(value)
    }

    /// Draw `centre * (1 + offset)`, so the spread scales with the centre.
    fn draw_relative(&self, rng: &mut StdRng, centre: Decimal) -> Decimal {
        let offset = self.offsets.draw(rng);
        let value = if offset == 0.0 {
            centre
        } else {
            centre * (Decimal::ONE + Decimal::from_f64(offset).unwrap_or(Decimal::ZERO))
        };
        self.bound(value)
    }

    fn bound(&self, mut value: Decimal) -> Decimal {
        if let Some(floor) = self.floor {
            value = value.max(floor);
        }
        if let Some(cap) = self.cap {
            value = value.min(cap);
        }
        value
    }
}

fn terminal_growth_for(
    policy: &TerminalGrowthPolicy,
    base_terminal: Rate,
    wacc: Rate,
    growth: Rate,
) -> Rate {
    match policy {
        TerminalGrowthPolicy::Fixed => base_terminal,
        TerminalGrowthPolicy::FractionOfWacc { fraction } => wacc * fraction,
        TerminalGrowthPolicy::FractionOfGrowth { fraction } => {
            (growth * fraction).max(Decimal::ZERO)
        }
    }
}

/// Percentile of a sorted slice with linear interpolation.
fn percentile_sorted(sorted: &[Decimal], p: Decimal) -> Decimal {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / dec!(100) * Decimal::from(sorted.len() - 1);
    let lower = rank.floor();
    let frac = rank - lower;
    let lo = lower.to_usize().unwrap_or(0).min(sorted.len() - 1);
    let hi = (lo + 1).min(sorted.len() - 1);
    if frac.is_zero() || sorted[lo] == sorted[hi] {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

fn median_sorted(sorted: &[Decimal]) -> Decimal {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        let (a, b) = (sorted[n / 2 - 1], sorted[n / 2]);
        if a == b {
            a
        } else {
            (a + b) / dec!(2)
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Simulate the DCF intrinsic value per share around `base`.
///
/// Returns `Ok(None)` when the snapshot has no free cash flow. Draws where
/// WACC does not exceed terminal growth are redrawn up to
/// `config.max_redraws` times, then the iteration is skipped.
pub fn sample(
    snapshot: &CompanyFinancials,
    base: &DcfAssumptions,
    config: &MonteCarloConfig,
) -> EquityAnalyzerResult<Option<MonteCarloResult>> {
    config.validate()?;
    snapshot.validate()?;

    let base_fcf = match snapshot.free_cash_flow {
        Some(f) => f,
        None => return Ok(None),
    };
    // Margin scaling only applies to a positive base margin
    let base_margin = snapshot.net_margin().filter(|m| *m > Decimal::ZERO);
    let net_debt = snapshot.net_debt();
    let shares = snapshot.shares_outstanding;

    let growth_sampler = VariableSampler::build(&config.distributions.growth, "growth")?;
    let margin_sampler = VariableSampler::build(&config.distributions.margin, "margin")?;
    let wacc_sampler = VariableSampler::build(&config.distributions.wacc, "wacc")?;

    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    let mut values: Vec<Money> = Vec::with_capacity(config.iterations as usize);
    let mut skipped: u32 = 0;

    for _ in 0..config.iterations {
        let mut outcome = None;
        for _ in 0..=config.max_redraws {
            let growth = growth_sampler.draw(&mut rng, base.growth_rate);
            let wacc = wacc_sampler.draw(&mut rng, base.wacc);
            let fcf = match base_margin {
                Some(m) => {
                    let drawn = margin_sampler.draw_relative(&mut rng, m);
                    base_fcf * (drawn / m).max(Decimal::ZERO)
                }
                None => base_fcf,
            };
            let tg = terminal_growth_for(&config.terminal_policy, base.terminal_growth, wacc, growth);

            let assumptions = DcfAssumptions::new(wacc, growth, tg);
            if assumptions.validate("monte carlo draw").is_err() {
                continue;
            }
            if let Ok(p) = project_cash_flows(fcf, net_debt, shares, &assumptions) {
                outcome = Some(p.intrinsic_value_per_share);
                break;
            }
        }
        match outcome {
            Some(v) => values.push(v),
            None => skipped += 1,
        }
    }

    let successful = values.len() as u32;
    let success_rate = Decimal::from(successful) / Decimal::from(config.iterations);
    let degraded = success_rate < config.min_success_rate;
    if degraded {
        warn!(
            successful,
            iterations = config.iterations,
            "monte carlo success rate below floor"
        );
    }
    debug!(successful, skipped, "monte carlo complete");

    values.sort();
    let (median, min, max, mean, p5, p95) = if values.is_empty() {
        (None, None, None, None, None, None)
    } else {
        let total: Decimal = values.iter().copied().sum();
        (
            Some(median_sorted(&values)),
            values.first().copied(),
            values.last().copied(),
            Some(total / Decimal::from(successful)),
            Some(percentile_sorted(&values, dec!(5))),
            Some(percentile_sorted(&values, dec!(95))),
        )
    };

    Ok(Some(MonteCarloResult {
        iterations: config.iterations,
        successful,
        skipped,
        median,
        min,
        max,
        mean,
        p5,
        p95,
        degraded,
    }))
}

/// [`sample`] wrapped in the standard output envelope.
pub fn simulate(
    snapshot: &CompanyFinancials,
    base: &DcfAssumptions,
    config: &MonteCarloConfig,
) -> EquityAnalyzerResult<ComputationOutput<MonteCarloResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let result = sample(snapshot, base, config)?.ok_or_else(|| {
        EquityAnalyzerError::MissingMetricInput {
            metric: "Monte Carlo DCF".into(),
            input: "free_cash_flow".into(),
        }
    })?;

    if result.skipped > 0 {
        warnings.push(format!(
            "{} of {} iterations skipped (WACC <= terminal growth after redraws)",
            result.skipped, result.iterations
        ));
    }
    if result.degraded {
        warnings.push(format!(
            "Only {} of {} iterations succeeded; distribution is degraded",
            result.successful, result.iterations
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monte Carlo DCF (5-year FCF, Gordon terminal value)",
        &serde_json::json!({ "base": base, "config": config }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
