pub mod aggregation;
pub mod oee;
pub mod production;

pub use aggregation::{BucketStats, StateAggregator};
pub use oee::OeeBreakdown;
pub use production::{Economics, IntervalStats, ProductionAggregator};
