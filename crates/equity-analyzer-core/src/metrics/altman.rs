use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::snapshot::CompanyFinancials;
use crate::types::ratio;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZScoreZone {
    Safe,
    Grey,
    Distress,
}

impl std::fmt::Display for ZScoreZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Safe => write!(f, "Safe"),
            Self::Grey => write!(f, "Grey Zone"),
            Self::Distress => write!(f, "Distress"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZScoreComponent {
    pub name: String,
    pub ratio: Decimal,
    pub coefficient: Decimal,
    pub weighted_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AltmanZScore {
    pub score: Decimal,
    pub zone: ZScoreZone,
    pub components: Vec<ZScoreComponent>,
}

// ---------------------------------------------------------------------------
// Coefficients
// ---------------------------------------------------------------------------

// Original Z-Score (public manufacturing)
const Z_COEFF_X1: Decimal = dec!(1.2);
const Z_COEFF_X2: Decimal = dec!(1.4);
const Z_COEFF_X3: Decimal = dec!(3.3);
const Z_COEFF_X4: Decimal = dec!(0.6);
const Z_COEFF_X5: Decimal = dec!(1.0);

// Zone thresholds
pub const Z_SAFE: Decimal = dec!(2.99);
pub const Z_DISTRESS: Decimal = dec!(1.81);

pub fn classify_zone(score: Decimal) -> ZScoreZone {
    if score > Z_SAFE {
        ZScoreZone::Safe
    } else if score < Z_DISTRESS {
        ZScoreZone::Distress
    } else {
        ZScoreZone::Grey
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Original Altman Z-Score.
///
/// Returns `None` if any input is missing, total assets / total liabilities
/// is zero, or the weighted sum leaves Decimal range. A missing term is never
/// defaulted to zero.
pub fn altman_z_score(snapshot: &CompanyFinancials) -> Option<AltmanZScore> {
    let total_assets = snapshot.total_assets?;
    let total_liabilities = snapshot.total_liabilities?;

    let x1 = ratio(snapshot.working_capital?, total_assets)?;
    let x2 = ratio(snapshot.retained_earnings?, total_assets)?;
    let x3 = ratio(snapshot.ebit?, total_assets)?;
    let x4 = ratio(snapshot.market_cap()?, total_liabilities)?;
    let x5 = ratio(snapshot.revenue?, total_assets)?;

    let components: Vec<ZScoreComponent> = [
        ("X1: WC / Total Assets", x1, Z_COEFF_X1),
        ("X2: Retained Earnings / Total Assets", x2, Z_COEFF_X2),
        ("X3: EBIT / Total Assets", x3, Z_COEFF_X3),
        ("X4: Market Cap / Total Liabilities", x4, Z_COEFF_X4),
        ("X5: Revenue / Total Assets", x5, Z_COEFF_X5),
    ]
    .into_iter()
    .map(|(name, r, c)| {
        Some(ZScoreComponent {
            name: name.to_string(),
            ratio: r,
            coefficient: c,
            weighted_value: r.checked_mul(c)?,
        })
    })
    .collect::<Option<_>>()?;

    let score = components
        .iter()
        .try_fold(Decimal::ZERO, |acc, c| acc.checked_add(c.weighted_value))?;

    Some(AltmanZScore {
        score,
        zone: classify_zone(score),
        components,
    })
}
