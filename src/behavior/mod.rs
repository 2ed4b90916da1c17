pub mod context;
pub mod definition;
pub mod orchestrator;
mod phases;

pub use context::{Awaiting, PhaseContext, Signal, Step};
pub use definition::{BehaviorDefinition, EnablementPredicate, PhaseKind, PhaseSpec, ResolvedBehavior};
pub use orchestrator::Orchestrator;
