use serde_json::Value;
use std::io;

use super::format_scalar;

/// Write output as CSV to stdout.
///
/// Objects are flattened into `field,value` rows with dotted paths
/// (`scoring.score_total`, `dcf_scenarios.scenarios.0.intrinsic_value`).
/// A top-level array becomes one row per element.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            let body = map.get("result").unwrap_or(value);
            let mut rows = Vec::new();
            flatten(None, body, &mut rows);
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in rows {
                let _ = wtr.write_record([key, val]);
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_scalar(value, "")]);
        }
    }

    let _ = wtr.flush();
}

fn flatten(prefix: Option<&str>, value: &Value, rows: &mut Vec<(String, String)>) {
    let join = |key: &str| match prefix {
        Some(p) => format!("{}.{}", p, key),
        None => key.to_string(),
    };
    match value {
        Value::Object(map) => {
            for (key, val) in map {
                flatten(Some(join(key).as_str()), val, rows);
            }
        }
        Value::Array(arr) if arr.iter().any(|v| v.is_object()) => {
            for (i, val) in arr.iter().enumerate() {
                flatten(Some(join(&i.to_string()).as_str()), val, rows);
            }
        }
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_scalar(v, "")).collect();
            rows.push((prefix.unwrap_or("value").to_string(), items.join("; ")));
        }
        other => rows.push((prefix.unwrap_or("value").to_string(), format_scalar(other, ""))),
    }
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(|v| format_scalar(v, "")).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item, "")]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_uses_dotted_paths() {
        let value = json!({
            "scoring": { "score_total": "72.5" },
            "dcf_scenarios": { "scenarios": [ { "scenario": "Bear" } ] },
            "notes": ["a", "b"]
        });
        let mut rows = Vec::new();
        flatten(None, &value, &mut rows);
        assert!(rows.contains(&("scoring.score_total".into(), "72.5".into())));
        assert!(rows.contains(&("dcf_scenarios.scenarios.0.scenario".into(), "Bear".into())));
        assert!(rows.contains(&("notes".into(), "a; b".into())));
    }
}
