pub mod dcf;
pub mod scenarios;

pub use dcf::{calculate_dcf, evaluate, project, DcfAssumptions, DcfInput, DcfProjection};
pub use scenarios::{
    aggregate, build_scenarios, calculate_scenarios, DcfScenarioBlock, ScenarioAssumptions, ScenarioDefinition,
    ScenarioResult,
};
