use serde_json::Value;

use super::format_scalar;

/// Headline answer per command, as dotted paths into the result, in
/// priority order.
const PRIORITY_PATHS: &[&str] = &[
    "recommandation.signal",
    "weighted_intrinsic_value",
    "intrinsic_value_per_share",
    "median",
    "advanced.piotroski_score",
    "error",
];

/// Print just the key answer value from the output.
///
/// For a full analysis this is a one-line summary of signal, verdict,
/// score and weighted intrinsic value. Otherwise the first non-null
/// priority path is printed, falling back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(line) = analysis_line(result_obj) {
        println!("{}", line);
        return;
    }

    for path in PRIORITY_PATHS {
        if let Some(val) = lookup(result_obj, path) {
            println!("{}", format_scalar(val, "null"));
            return;
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_scalar(val, "null"));
            return;
        }
    }

    println!("{}", format_scalar(result_obj, "null"));
}

/// `ACME: buy | undervalued | score 72.5 | intrinsic 51.20`
fn analysis_line(result: &Value) -> Option<String> {
    let ticker = lookup(result, "ticker")?;
    let signal = lookup(result, "recommandation.signal")?;
    let mut parts = vec![format_scalar(signal, "n/a")];
    if let Some(state) = lookup(result, "verdict_final.state") {
        parts.push(format_scalar(state, "n/a"));
    }
    if let Some(score) = lookup(result, "scoring.score_total") {
        parts.push(format!("score {}", format_scalar(score, "n/a")));
    }
    if let Some(value) = lookup(result, "dcf_scenarios.weighted_intrinsic_value") {
        parts.push(format!("intrinsic {}", format_scalar(value, "n/a")));
    }
    Some(format!("{}: {}", format_scalar(ticker, ""), parts.join(" | ")))
}

/// Follow a dotted path, skipping nulls.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let found = path
        .split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))?;
    (!found.is_null()).then_some(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_skips_null() {
        let v = json!({ "a": { "b": null, "c": "1.5" } });
        assert!(lookup(&v, "a.b").is_none());
        assert_eq!(lookup(&v, "a.c"), Some(&json!("1.5")));
        assert!(lookup(&v, "a.c.d").is_none());
    }

    #[test]
    fn test_analysis_line() {
        let v = json!({
            "ticker": "ACME",
            "recommandation": { "signal": "buy" },
            "verdict_final": { "state": "undervalued" },
            "scoring": { "score_total": "72.5" },
            "dcf_scenarios": { "weighted_intrinsic_value": null }
        });
        assert_eq!(
            analysis_line(&v).unwrap(),
            "ACME: buy | undervalued | score 72.5"
        );
    }

    #[test]
    fn test_non_analysis_has_no_summary_line() {
        let v = json!({ "median": "40.1" });
        assert!(analysis_line(&v).is_none());
    }
}
