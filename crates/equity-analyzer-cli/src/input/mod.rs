pub mod file;
pub mod stdin;

use equity_analyzer_core::{AnalysisConfig, CompanyFinancials};

/// Snapshot from `--input`, falling back to piped stdin.
pub fn load_snapshot(path: Option<&str>) -> Result<CompanyFinancials, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        file::read_json(path)
    } else if let Some(snapshot) = stdin::read_stdin()? {
        Ok(snapshot)
    } else {
        Err("--input <snapshot.json> is required (or pipe the snapshot on stdin)".into())
    }
}

/// Configuration from `--config`, or the defaults when none is given.
pub fn load_config(path: Option<&str>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => file::read_config(path),
        None => Ok(AnalysisConfig::default()),
    }
}
