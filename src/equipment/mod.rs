pub mod process;
pub mod state;

pub use process::{EquipmentProcess, StationCounters, StationPorts, StationReport, StationRuntime};
pub use state::{StateLedger, StateTimes, StationState, Transition};
