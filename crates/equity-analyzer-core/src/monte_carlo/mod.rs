pub mod sampler;

pub use sampler::{
    sample, simulate, McDistributions, McVariableSpec, MonteCarloConfig, MonteCarloResult,
    SpreadDistribution, TerminalGrowthPolicy,
};
