use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquityAnalyzerError {
    #[error("Invalid snapshot: {field} — {reason}")]
    InvalidSnapshot { field: String, reason: String },

    #[error("Invalid assumptions for {scenario}: {reason}")]
    InvalidAssumptions { scenario: String, reason: String },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Missing metric input: {metric} requires {input}")]
    MissingMetricInput { metric: String, input: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for EquityAnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        EquityAnalyzerError::SerializationError(e.to_string())
    }
}
