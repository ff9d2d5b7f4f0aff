pub mod config;
pub mod pipeline;

pub use config::AnalysisConfig;
pub use pipeline::{
    analyze, growth_for, run_analysis, AnalysisResult, DcfSection, GrowthSource, KeyData,
};
