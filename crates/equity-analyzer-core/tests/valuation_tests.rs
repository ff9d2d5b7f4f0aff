use equity_analyzer_core::snapshot::CompanyFinancials;
use equity_analyzer_core::time_value;
use equity_analyzer_core::valuation::{aggregate, build_scenarios, dcf, DcfAssumptions, ScenarioDefinition};
use equity_analyzer_core::EquityAnalyzerError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn mature_company() -> CompanyFinancials {
    CompanyFinancials {
        ticker: "MATR".into(),
        name: Some("Mature Industrial Co".into()),
        sector: Some("Industrials".into()),
        price: Some(dec!(45)),
        shares_outstanding: dec!(200),
        free_cash_flow: Some(dec!(800)),
        total_debt: Some(dec!(2500)),
        total_cash: Some(dec!(500)),
        ..Default::default()
    }
}

// ===========================================================================
// DCF evaluator
// ===========================================================================

#[test]
fn test_dcf_hand_computed_reference() {
    // FCF 800 growing 5%, WACC 9%, tg 2.5%, net debt 2000 (2500 - 500)
    let snap = mature_company();
    let a = DcfAssumptions::new(dec!(0.09), dec!(0.05), dec!(0.025));
    let p = dcf::project(&snap, &a).unwrap().unwrap();

    let mut pv_sum = Decimal::ZERO;
    for t in 1..=5u32 {
        let fcf = dec!(800) * time_value::compound_factor(dec!(0.05), t).unwrap();
        pv_sum += time_value::present_value(fcf, dec!(0.09), t).unwrap();
    }
    let fcf5 = dec!(800) * time_value::compound_factor(dec!(0.05), 5).unwrap();
    let tv = fcf5 * dec!(1.025) / dec!(0.065);
    let pv_tv = time_value::present_value(tv, dec!(0.09), 5).unwrap();
    let expected = (pv_sum + pv_tv - dec!(2000)) / dec!(200);

    assert_eq!(p.net_debt_used, dec!(2000));
    assert!((p.intrinsic_value_per_share - expected).abs() < dec!(0.0000001));
    // ~ 60.2 per share on these inputs
    assert!(p.intrinsic_value_per_share > dec!(58) && p.intrinsic_value_per_share < dec!(62));
}

#[test]
fn test_dcf_terminal_share_is_reported() {
    let snap = mature_company();
    let p = dcf::project(&snap, &DcfAssumptions::new(dec!(0.09), dec!(0.05), dec!(0.025)))
        .unwrap()
        .unwrap();
    assert!(p.terminal_value_pct > dec!(0.5) && p.terminal_value_pct < Decimal::ONE);
    assert_eq!(p.projections.len(), dcf::PROJECTION_YEARS as usize);
}

#[test]
fn test_dcf_higher_wacc_lowers_value() {
    let snap = mature_company();
    let low = dcf::evaluate(&snap, dec!(0.07), dec!(0.05), dec!(0.025)).unwrap().unwrap();
    let high = dcf::evaluate(&snap, dec!(0.11), dec!(0.05), dec!(0.025)).unwrap().unwrap();
    assert!(low > high);
}

#[test]
fn test_dcf_invalid_for_every_snapshot_when_wacc_not_above_tg() {
    let mut snapshots = vec![mature_company()];
    let mut no_fcf = mature_company();
    no_fcf.free_cash_flow = None;
    snapshots.push(no_fcf);
    let mut negative_fcf = mature_company();
    negative_fcf.free_cash_flow = Some(dec!(-300));
    snapshots.push(negative_fcf);

    for snap in &snapshots {
        for (wacc, tg) in [(dec!(0.04), dec!(0.04)), (dec!(0.03), dec!(0.04))] {
            let err = dcf::evaluate(snap, wacc, dec!(0.05), tg).unwrap_err();
            assert!(matches!(err, EquityAnalyzerError::InvalidAssumptions { .. }));
        }
    }
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[test]
fn test_scenario_block_preserves_order_and_weights() {
    let snap = mature_company();
    let base = DcfAssumptions::new(dec!(0.08), dec!(0.05), dec!(0.025));
    let (scenarios, warnings) = build_scenarios(&ScenarioDefinition::defaults(), &base).unwrap();
    assert!(warnings.is_empty());

    let block = aggregate(&snap, &scenarios).unwrap();
    let names: Vec<&str> = block.scenarios.iter().map(|s| s.scenario.as_str()).collect();
    assert_eq!(names, vec!["Bear", "Base", "Bull"]);

    let weights: Vec<Decimal> = block.scenarios.iter().map(|s| s.weight).collect();
    assert_eq!(weights, vec![dec!(0.25), dec!(0.50), dec!(0.25)]);

    let expected: Decimal = block
        .scenarios
        .iter()
        .map(|s| s.weight * s.intrinsic_value.unwrap())
        .sum();
    assert!((block.weighted_intrinsic_value.unwrap() - expected).abs() < dec!(0.000000001));
}

#[test]
fn test_base_scenario_matches_direct_evaluation() {
    let snap = mature_company();
    let base = DcfAssumptions::new(dec!(0.08), dec!(0.05), dec!(0.025));
    let (scenarios, _) = build_scenarios(&ScenarioDefinition::defaults(), &base).unwrap();
    let block = aggregate(&snap, &scenarios).unwrap();
    let direct = dcf::evaluate(&snap, dec!(0.08), dec!(0.05), dec!(0.025)).unwrap();
    assert_eq!(block.scenarios[1].intrinsic_value, direct);
}

#[test]
fn test_custom_two_scenario_set() {
    let snap = mature_company();
    let base = DcfAssumptions::new(dec!(0.08), dec!(0.05), dec!(0.025));
    let defs = vec![
        ScenarioDefinition::new("Downside", dec!(0.4), dec!(0), dec!(0.01), dec!(0)),
        ScenarioDefinition::new("Upside", dec!(0.6), dec!(1.5), dec!(0), dec!(0)),
    ];
    let (scenarios, _) = build_scenarios(&defs, &base).unwrap();
    assert_eq!(scenarios[0].growth_rate, Decimal::ZERO);
    assert_eq!(scenarios[1].growth_rate, dec!(0.075));
    let block = aggregate(&snap, &scenarios).unwrap();
    assert_eq!(block.scenarios.len(), 2);
    assert!(block.weighted_intrinsic_value.is_some());
}
