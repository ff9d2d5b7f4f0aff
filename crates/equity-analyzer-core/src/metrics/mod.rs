pub mod advanced;
pub mod altman;
pub mod multiples;
pub mod piotroski;

pub use advanced::{advanced_metrics, calculate_metrics, compute, compute_with_threshold, AdvancedMetrics, MetricsOutput};
pub use altman::{altman_z_score, AltmanZScore, ZScoreZone};
pub use multiples::{classify_ratio, multiples_analysis, RatioRow, RatioVerdict};
pub use piotroski::{piotroski_score, PiotroskiScore};
