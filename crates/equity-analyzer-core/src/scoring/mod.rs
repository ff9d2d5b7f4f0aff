pub mod composer;
pub mod verdict;

pub use composer::{compose, Pillar, ScoreWeights, ScoringSection};
pub use verdict::{
    build_recommendation, build_verdict, classify_verdict, investor_summary, RecommendationSection,
    Signal, VerdictSection, VerdictState,
};
