pub mod error;
pub mod time_value;
pub mod types;

pub mod snapshot;
pub mod valuation;

#[cfg(feature = "monte_carlo")]
pub mod monte_carlo;

pub mod metrics;
pub mod scoring;

pub mod analysis;

pub use analysis::{analyze, run_analysis, AnalysisConfig, AnalysisResult};
pub use error::EquityAnalyzerError;
pub use snapshot::{CompanyFinancials, SnapshotOverrides};
pub use types::*;

/// Standard result type for all equity-analyzer operations
pub type EquityAnalyzerResult<T> = Result<T, EquityAnalyzerError>;
