pub mod buffer;
pub mod errors;
pub mod material;
pub mod scheduler;
pub mod types;

pub use buffer::{Buffer, BufferSnapshot, Handoff};
pub use errors::{Result, SimError};
pub use material::{AttributeValue, MaterialId, MaterialKind, MaterialUnit};
pub use scheduler::{ScheduledEvent, Scheduler};
pub use types::{BufferId, ProcessId, SimTime};
