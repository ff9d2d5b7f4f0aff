pub mod financials;
pub mod overrides;

pub use financials::{CompanyFinancials, MultipleSet, PriorYearFundamentals};
pub use overrides::SnapshotOverrides;
