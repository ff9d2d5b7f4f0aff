use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::snapshot::CompanyFinancials;
use crate::types::{ratio, saturating_gap, Multiple, Rate};

/// Deviation from the benchmark beyond which a multiple is called cheap or
/// expensive.
pub const DEFAULT_RATIO_THRESHOLD: Rate = dec!(0.10);

/// Fair-value anchor for PEG when no benchmark is available.
pub const PEG_FAIR_VALUE: Multiple = dec!(1.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioVerdict {
    Undervalued,
    Overvalued,
    InLine,
    InsufficientData,
}

impl std::fmt::Display for RatioVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undervalued => write!(f, "Undervalued"),
            Self::Overvalued => write!(f, "Overvalued"),
            Self::InLine => write!(f, "In line"),
            Self::InsufficientData => write!(f, "Insufficient data"),
        }
    }
}

/// Where the benchmark for a verdict came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BenchmarkSource {
    Sector,
    Historical,
    /// Both the sector value and the 5-year history were compared
    SectorAndHistorical,
    FairValueAnchor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioRow {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    /// The formula with this company's numbers substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calculation: Option<String>,
    pub value: Option<Multiple>,
    pub sector: Option<Multiple>,
    pub historical_5y: Option<Multiple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark_source: Option<BenchmarkSource>,
    /// Verdict against the 5-year history alone, when there is one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub historical_verdict: Option<RatioVerdict>,
    pub verdict: RatioVerdict,
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Compare a multiple against a benchmark. A lower multiple than the
/// benchmark reads as undervalued.
pub fn classify_ratio(value: Option<Multiple>, benchmark: Option<Multiple>, threshold: Rate) -> RatioVerdict {
    let (value, benchmark) = match (value, benchmark) {
        (Some(v), Some(b)) if b > Decimal::ZERO => (v, b),
        _ => return RatioVerdict::InsufficientData,
    };
    let deviation = saturating_gap(value, benchmark);
    if deviation <= -threshold {
        RatioVerdict::Undervalued
    } else if deviation >= threshold {
        RatioVerdict::Overvalued
    } else {
        RatioVerdict::InLine
    }
}

fn fmt2(v: Decimal) -> String {
    format!("{:.2}", v)
}

struct RowSpec<'a> {
    name: &'a str,
    formula: &'a str,
    value: Option<Multiple>,
    calculation: Option<String>,
    sector: Option<Multiple>,
    historical: Option<Multiple>,
    anchor: Option<Multiple>,
}

/// Merge per-benchmark verdicts. A cheap or expensive call needs every
/// benchmark to agree; a split reads as in line.
fn combine_verdicts(sector: RatioVerdict, historical: RatioVerdict) -> RatioVerdict {
    match (sector, historical) {
        (RatioVerdict::InsufficientData, other) | (other, RatioVerdict::InsufficientData) => other,
        (a, b) if a == b => a,
        _ => RatioVerdict::InLine,
    }
}

fn build_row(spec: RowSpec<'_>, threshold: Rate) -> RatioRow {
    let sector_verdict = classify_ratio(spec.value, spec.sector, threshold);
    let historical_verdict = classify_ratio(spec.value, spec.historical, threshold);

    let (verdict, source) = match (sector_verdict, historical_verdict) {
        (RatioVerdict::InsufficientData, RatioVerdict::InsufficientData) => {
            let anchored = classify_ratio(spec.value, spec.anchor, threshold);
            (anchored, Some(BenchmarkSource::FairValueAnchor))
        }
        (_, RatioVerdict::InsufficientData) => (sector_verdict, Some(BenchmarkSource::Sector)),
        (RatioVerdict::InsufficientData, _) => {
            (historical_verdict, Some(BenchmarkSource::Historical))
        }
        (s, h) => (combine_verdicts(s, h), Some(BenchmarkSource::SectorAndHistorical)),
    };

    RatioRow {
        name: spec.name.to_string(),
        formula: Some(spec.formula.to_string()),
        calculation: spec.calculation,
        value: spec.value,
        sector: spec.sector,
        historical_5y: spec.historical,
        benchmark_source: if verdict == RatioVerdict::InsufficientData {
            None
        } else {
            source
        },
        historical_verdict: match historical_verdict {
            RatioVerdict::InsufficientData => None,
            v => Some(v),
        },
        verdict,
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// P/E, PEG, P/B, P/S and EV/EBITDA with per-row verdicts.
///
/// A multiple whose denominator is zero or negative is null and its verdict
/// is `InsufficientData`.
pub fn multiples_analysis(snapshot: &CompanyFinancials, threshold: Rate) -> Vec<RatioRow> {
    let sector = snapshot.sector_multiples();
    let history = &snapshot.historical_multiples;
    let price = snapshot.price.filter(|p| *p > Decimal::ZERO);
    let mcap = snapshot.market_cap();

    // P/E
    let eps = snapshot.eps.filter(|e| *e > Decimal::ZERO);
    let pe = price.zip(eps).and_then(|(p, e)| ratio(p, e));
    let pe_calc = price.zip(eps).zip(pe).map(|((p, e), v)| {
        format!("{} / {} = {}", fmt2(p), fmt2(e), fmt2(v))
    });

    // PEG: P/E over growth in percent
    let growth_pct = snapshot
        .growth_rate
        .filter(|g| *g > Decimal::ZERO)
        .and_then(|g| g.checked_mul(dec!(100)));
    let peg = pe.zip(growth_pct).and_then(|(v, g)| ratio(v, g));
    let peg_calc = pe.zip(growth_pct).zip(peg).map(|((v, g), r)| {
        format!("{} / {} = {}", fmt2(v), fmt2(g), fmt2(r))
    });

    // P/B
    let bvps = snapshot.book_value_per_share().filter(|b| *b > Decimal::ZERO);
    let pb = price.zip(bvps).and_then(|(p, b)| ratio(p, b));
    let pb_calc = price.zip(bvps).zip(pb).map(|((p, b), v)| {
        format!("{} / {} = {}", fmt2(p), fmt2(b), fmt2(v))
    });

    // P/S
    let revenue = snapshot.revenue.filter(|r| *r > Decimal::ZERO);
    let ps = mcap.zip(revenue).and_then(|(m, r)| ratio(m, r));
    let ps_calc = mcap.zip(revenue).zip(ps).map(|((m, r), v)| {
        format!("{} / {} = {}", fmt2(m), fmt2(r), fmt2(v))
    });

    // EV/EBITDA
    let ebitda = snapshot.ebitda.filter(|e| *e > Decimal::ZERO);
    let ev = mcap.map(|m| m + snapshot.net_debt().unwrap_or(Decimal::ZERO));
    let ev_ebitda = ev.zip(ebitda).and_then(|(e, d)| ratio(e, d));
    let ev_calc = ev.zip(ebitda).zip(ev_ebitda).map(|((e, d), v)| {
        format!("{} / {} = {}", fmt2(e), fmt2(d), fmt2(v))
    });

    vec![
        build_row(
            RowSpec {
                name: "P/E",
                formula: "Price / EPS",
                value: pe,
                calculation: pe_calc,
                sector: sector.pe,
                historical: history.pe,
                anchor: None,
            },
            threshold,
        ),
        build_row(
            RowSpec {
                name: "PEG",
                formula: "P/E / (Growth x 100)",
                value: peg,
                calculation: peg_calc,
                sector: None,
                historical: None,
                anchor: Some(PEG_FAIR_VALUE),
            },
            threshold,
        ),
        build_row(
            RowSpec {
                name: "P/B",
                formula: "Price / Book value per share",
                value: pb,
                calculation: pb_calc,
                sector: sector.pb,
                historical: history.pb,
                anchor: None,
            },
            threshold,
        ),
        build_row(
            RowSpec {
                name: "P/S",
                formula: "Market cap / Revenue",
                value: ps,
                calculation: ps_calc,
                sector: sector.ps,
                historical: history.ps,
                anchor: None,
            },
            threshold,
        ),
        build_row(
            RowSpec {
                name: "EV/EBITDA",
                formula: "(Market cap + Net debt) / EBITDA",
                value: ev_ebitda,
                calculation: ev_calc,
                sector: sector.ev_ebitda,
                historical: history.ev_ebitda,
                anchor: None,
            },
            threshold,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MultipleSet;

    fn snapshot() -> CompanyFinancials {
        CompanyFinancials {
            ticker: "ACME".into(),
            sector: Some("Technology".into()),
            price: Some(dec!(100)),
            eps: Some(dec!(5)),
            shares_outstanding: dec!(10),
            book_value_per_share: Some(dec!(20)),
            revenue: Some(dec!(250)),
            ebitda: Some(dec!(100)),
            net_debt: Some(dec!(200)),
            growth_rate: Some(dec!(0.10)),
            ..Default::default()
        }
    }

    fn row<'a>(rows: &'a [RatioRow], name: &str) -> &'a RatioRow {
        rows.iter().find(|r| r.name == name).unwrap()
    }

    #[test]
    fn test_values_and_sector_verdicts() {
        let rows = multiples_analysis(&snapshot(), DEFAULT_RATIO_THRESHOLD);
        assert_eq!(rows.len(), 5);

        // P/E 20 vs Technology 27: 26% below
        let pe = row(&rows, "P/E");
        assert_eq!(pe.value, Some(dec!(20)));
        assert_eq!(pe.verdict, RatioVerdict::Undervalued);
        assert_eq!(pe.calculation.as_deref(), Some("100.00 / 5.00 = 20.00"));

        // PEG 20 / 10 = 2 vs anchor 1
        let peg = row(&rows, "PEG");
        assert_eq!(peg.value, Some(dec!(2)));
        assert_eq!(peg.verdict, RatioVerdict::Overvalued);
        assert_eq!(peg.benchmark_source, Some(BenchmarkSource::FairValueAnchor));

        // P/B 5 vs 8
        assert_eq!(row(&rows, "P/B").verdict, RatioVerdict::Undervalued);

        // P/S: 1000 / 250 = 4 vs 6
        assert_eq!(row(&rows, "P/S").value, Some(dec!(4)));

        // EV/EBITDA: (1000 + 200) / 100 = 12 vs 20
        assert_eq!(row(&rows, "EV/EBITDA").value, Some(dec!(12)));
    }

    #[test]
    fn test_threshold_band_is_in_line() {
        let mut snap = snapshot();
        snap.sector_multiples = Some(MultipleSet {
            pe: Some(dec!(21)),
            ..Default::default()
        });
        let rows = multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD);
        // 20 vs 21 is a 4.8% discount
        assert_eq!(row(&rows, "P/E").verdict, RatioVerdict::InLine);
    }

    #[test]
    fn test_falls_back_to_history() {
        let mut snap = snapshot();
        snap.sector_multiples = Some(MultipleSet::default());
        snap.historical_multiples = MultipleSet {
            pe: Some(dec!(15)),
            ..Default::default()
        };
        let rows = multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD);
        let pe = row(&rows, "P/E");
        assert_eq!(pe.benchmark_source, Some(BenchmarkSource::Historical));
        assert_eq!(pe.verdict, RatioVerdict::Overvalued);
        assert_eq!(row(&rows, "P/B").verdict, RatioVerdict::InsufficientData);
    }

    #[test]
    fn test_history_can_overrule_sector() {
        // P/E 20 vs sector 18 is 11% rich
        let with_history = |pe: Decimal| {
            let mut snap = snapshot();
            snap.sector_multiples = Some(MultipleSet {
                pe: Some(dec!(18)),
                ..Default::default()
            });
            snap.historical_multiples = MultipleSet {
                pe: Some(pe),
                ..Default::default()
            };
            multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD)
        };

        let cheap_history = with_history(dec!(10));
        let pe = row(&cheap_history, "P/E");
        assert_eq!(pe.verdict, RatioVerdict::Overvalued);
        assert_eq!(pe.historical_verdict, Some(RatioVerdict::Overvalued));
        assert_eq!(pe.benchmark_source, Some(BenchmarkSource::SectorAndHistorical));

        let rich_history = with_history(dec!(40));
        let pe = row(&rich_history, "P/E");
        assert_eq!(pe.historical_verdict, Some(RatioVerdict::Undervalued));
        assert_eq!(pe.verdict, RatioVerdict::InLine);
    }

    #[test]
    fn test_sector_only_row_has_no_historical_verdict() {
        let rows = multiples_analysis(&snapshot(), DEFAULT_RATIO_THRESHOLD);
        let pe = row(&rows, "P/E");
        assert_eq!(pe.benchmark_source, Some(BenchmarkSource::Sector));
        assert_eq!(pe.historical_verdict, None);
    }

    #[test]
    fn test_extreme_values_classify_without_overflow() {
        assert_eq!(
            classify_ratio(Some(Decimal::MAX), Some(dec!(0.0000001)), dec!(0.1)),
            RatioVerdict::Overvalued
        );
        let mut snap = snapshot();
        snap.growth_rate = Some(Decimal::MAX);
        let rows = multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD);
        assert_eq!(row(&rows, "PEG").value, None);
    }

    #[test]
    fn test_combine_verdicts() {
        use RatioVerdict::*;
        assert_eq!(combine_verdicts(Undervalued, Undervalued), Undervalued);
        assert_eq!(combine_verdicts(Undervalued, InLine), InLine);
        assert_eq!(combine_verdicts(Overvalued, Undervalued), InLine);
        assert_eq!(combine_verdicts(InsufficientData, Overvalued), Overvalued);
    }

    #[test]
    fn test_negative_eps_nulls_pe_and_peg() {
        let mut snap = snapshot();
        snap.eps = Some(dec!(-1));
        let rows = multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD);
        assert_eq!(row(&rows, "P/E").value, None);
        assert_eq!(row(&rows, "P/E").verdict, RatioVerdict::InsufficientData);
        assert_eq!(row(&rows, "PEG").value, None);
    }

    #[test]
    fn test_zero_revenue_nulls_ps() {
        let mut snap = snapshot();
        snap.revenue = Some(Decimal::ZERO);
        let rows = multiples_analysis(&snap, DEFAULT_RATIO_THRESHOLD);
        assert_eq!(row(&rows, "P/S").value, None);
        assert_eq!(row(&rows, "P/S").verdict, RatioVerdict::InsufficientData);
    }

    #[test]
    fn test_classify_ratio_requires_positive_benchmark() {
        assert_eq!(
            classify_ratio(Some(dec!(10)), Some(Decimal::ZERO), dec!(0.1)),
            RatioVerdict::InsufficientData
        );
        assert_eq!(
            classify_ratio(Some(dec!(9)), Some(dec!(10)), dec!(0.1)),
            RatioVerdict::Undervalued
        );
        assert_eq!(
            classify_ratio(Some(dec!(11)), Some(dec!(10)), dec!(0.1)),
            RatioVerdict::Overvalued
        );
    }
}
