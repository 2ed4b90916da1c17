pub mod run;
pub mod source;
pub mod station;

pub use run::{ConcurrencyMode, ReplicationConfig, RunConfig};
pub use source::{ProductConfig, SourceConfig};
pub use station::{CostRates, PerformanceParams, QualityParams, ReliabilityParams, StationConfig};
