use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use equity_analyzer_core::analysis::growth_for;
use equity_analyzer_core::valuation::DcfAssumptions;
use equity_analyzer_core::{AnalysisConfig, CompanyFinancials};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// `{ "snapshot": {...}, "config": {...} }`; `config` may be omitted.
#[derive(Deserialize)]
struct AnalysisRequest {
    snapshot: CompanyFinancials,
    #[serde(default)]
    config: AnalysisConfig,
}

#[derive(Deserialize)]
struct MetricsRequest {
    snapshot: CompanyFinancials,
    #[serde(default)]
    ratio_threshold: Option<Decimal>,
}

fn parse_request(request_json: &str) -> NapiResult<AnalysisRequest> {
    serde_json::from_str(request_json).map_err(to_napi_error)
}

/// Validated config, merged snapshot and base assumptions for a
/// single-stage call.
fn prepare(
    request: AnalysisRequest,
) -> NapiResult<(CompanyFinancials, AnalysisConfig, DcfAssumptions)> {
    request.config.validate().map_err(to_napi_error)?;
    let (snapshot, _) = request
        .config
        .overrides
        .apply(&request.snapshot)
        .map_err(to_napi_error)?;
    let (growth, _) = growth_for(&snapshot, &request.config);
    let base = DcfAssumptions::new(
        request.config.wacc,
        growth,
        request.config.terminal_growth,
    );
    Ok((snapshot, request.config, base))
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Full report. Failures are embedded in the report's `error` field.
#[napi]
pub fn analyze_company(request_json: String) -> NapiResult<String> {
    let request = parse_request(&request_json)?;
    let report = equity_analyzer_core::analyze(&request.snapshot, &request.config);
    serde_json::to_string(&report).map_err(to_napi_error)
}

/// Full report in the standard envelope. Failures reject.
#[napi]
pub fn run_analysis(request_json: String) -> NapiResult<String> {
    let request = parse_request(&request_json)?;
    let output = equity_analyzer_core::run_analysis(&request.snapshot, &request.config)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn default_config() -> NapiResult<String> {
    serde_json::to_string(&AnalysisConfig::default()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[napi]
pub fn build_dcf(input_json: String) -> NapiResult<String> {
    let input: equity_analyzer_core::valuation::DcfInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        equity_analyzer_core::valuation::calculate_dcf(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn dcf_scenarios(request_json: String) -> NapiResult<String> {
    let (snapshot, config, base) = prepare(parse_request(&request_json)?)?;
    let output =
        equity_analyzer_core::valuation::calculate_scenarios(&snapshot, &config.scenarios, &base)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn monte_carlo_dcf(request_json: String) -> NapiResult<String> {
    let (snapshot, config, base) = prepare(parse_request(&request_json)?)?;
    let output =
        equity_analyzer_core::monte_carlo::simulate(&snapshot, &base, &config.monte_carlo)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn equity_metrics(request_json: String) -> NapiResult<String> {
    let request: MetricsRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let threshold = request
        .ratio_threshold
        .unwrap_or(equity_analyzer_core::metrics::multiples::DEFAULT_RATIO_THRESHOLD);
    let output = equity_analyzer_core::metrics::calculate_metrics(&request.snapshot, threshold)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
