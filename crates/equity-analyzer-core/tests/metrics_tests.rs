use equity_analyzer_core::metrics::{altman_z_score, compute, piotroski_score, RatioVerdict, ZScoreZone};
use equity_analyzer_core::scoring::{classify_verdict, compose, ScoreWeights, VerdictState};
use equity_analyzer_core::snapshot::{CompanyFinancials, PriorYearFundamentals};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn test_altman_reference_fixture() {
    let snap = CompanyFinancials {
        ticker: "ALT".into(),
        shares_outstanding: dec!(50),
        working_capital: Some(dec!(100)),
        retained_earnings: Some(dec!(50)),
        ebit: Some(dec!(30)),
        total_assets: Some(dec!(500)),
        market_cap: Some(dec!(800)),
        total_liabilities: Some(dec!(200)),
        revenue: Some(dec!(600)),
        ..Default::default()
    };
    let z = altman_z_score(&snap).unwrap();
    assert_eq!(z.score, dec!(4.178));
    assert_eq!(z.zone, ZScoreZone::Safe);

    let mut zero_assets = snap.clone();
    zero_assets.total_assets = Some(Decimal::ZERO);
    assert!(altman_z_score(&zero_assets).is_none());
}

#[test]
fn test_piotroski_bounds() {
    let strong = CompanyFinancials {
        ticker: "P9".into(),
        shares_outstanding: dec!(100),
        net_income: Some(dec!(10)),
        operating_cash_flow: Some(dec!(15)),
        total_assets: Some(dec!(100)),
        revenue: Some(dec!(90)),
        leverage: Some(dec!(0.3)),
        current_ratio: Some(dec!(1.4)),
        gross_margin: Some(dec!(0.5)),
        prior_year: PriorYearFundamentals {
            roa: Some(dec!(0.08)),
            leverage: Some(dec!(0.35)),
            current_ratio: Some(dec!(1.2)),
            gross_margin: Some(dec!(0.45)),
            asset_turnover: Some(dec!(0.85)),
            shares_outstanding: Some(dec!(100)),
        },
        ..Default::default()
    };
    // ROA and asset turnover derived from total assets: 0.10 and 0.90
    assert_eq!(piotroski_score(&strong).f_score, 9);

    let empty = CompanyFinancials {
        ticker: "P0".into(),
        shares_outstanding: dec!(100),
        ..Default::default()
    };
    assert_eq!(piotroski_score(&empty).f_score, 0);
}

#[test]
fn test_degenerate_snapshot_scores_midpoint() {
    let snap = CompanyFinancials {
        ticker: "NULL".into(),
        shares_outstanding: dec!(1),
        ..Default::default()
    };
    let (ratios, metrics) = compute(&snap);
    assert!(ratios.iter().all(|r| r.verdict == RatioVerdict::InsufficientData));
    let scoring = compose(&snap, None, &ratios, &metrics, &ScoreWeights::default()).unwrap();
    assert_eq!(scoring.score_total, dec!(50));
}

#[test]
fn test_verdict_reference_cases() {
    let t = dec!(0.10);
    let price = Some(dec!(100));
    assert_eq!(classify_verdict(price, Some(dec!(115)), t).0, VerdictState::Undervalued);
    assert_eq!(classify_verdict(price, Some(dec!(90)), t).0, VerdictState::Overvalued);
    assert_eq!(classify_verdict(price, Some(dec!(105)), t).0, VerdictState::Neutral);
    assert_eq!(classify_verdict(price, None, t).0, VerdictState::InsufficientData);
}
