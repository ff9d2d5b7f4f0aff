use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Multiples (e.g., 18.5x P/E)
pub type Multiple = Decimal;

/// Pillar and composite scores on a 0-100 scale
pub type Score = Decimal;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Divide, returning `None` when the denominator is zero.
///
/// Ratio code treats a zero denominator as missing data, not as a fault.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        None
    } else {
        numerator.checked_div(denominator)
    }
}

/// `ratio` over optional operands.
pub fn ratio_opt(numerator: Option<Decimal>, denominator: Option<Decimal>) -> Option<Decimal> {
    match (numerator, denominator) {
        (Some(n), Some(d)) => ratio(n, d),
        _ => None,
    }
}

/// `(value - base) / base` for a positive `base`, saturating at
/// `Decimal::MAX`/`Decimal::MIN` when the result leaves Decimal range.
pub fn saturating_gap(value: Decimal, base: Decimal) -> Decimal {
    let saturated = if value > base { Decimal::MAX } else { Decimal::MIN };
    value
        .checked_sub(base)
        .and_then(|diff| diff.checked_div(base))
        .unwrap_or(saturated)
}

/// Clamp a score into [0, 100].
pub fn clamp_score(value: Decimal) -> Score {
    value.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED)
}
