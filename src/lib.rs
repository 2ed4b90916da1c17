pub mod behavior;
pub mod config;
pub mod core;
pub mod equipment;
pub mod replication;
pub mod simulation;
pub mod telemetry;
pub mod topology;

// Re-export commonly used types
pub use crate::behavior::{BehaviorDefinition, EnablementPredicate, PhaseKind, ResolvedBehavior};
pub use crate::config::{
    ConcurrencyMode, CostRates, PerformanceParams, ProductConfig, QualityParams, ReliabilityParams,
    ReplicationConfig, RunConfig, SourceConfig, StationConfig,
};
pub use crate::core::{BufferSnapshot, MaterialId, MaterialKind, MaterialUnit, Result, SimError, SimTime};
pub use crate::equipment::{StationReport, StationState};
pub use crate::replication::{run_replications, LineDefinition, ReplicationOutcome};
pub use crate::simulation::{Layout, LayoutBuilder, ProductionRecord, RunSummary, Simulation, StateChange};
pub use crate::topology::{RoutePredicate, TopologyGraph};
