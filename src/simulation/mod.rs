pub mod engine;
pub mod layout;
pub mod records;
pub mod world;

pub use engine::{RunSummary, Simulation};
pub use layout::{Layout, LayoutBuilder};
pub use records::{ProductionRecord, StateChange};
pub use world::{Resumption, SourceSupply, World};
