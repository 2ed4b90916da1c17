use crate::core::material::MaterialUnit;
use crate::core::types::BufferId;

/// Why a suspended station is resumed
#[derive(Debug, Clone)]
pub enum Signal {
    /// First resumption of the run
    Start,
    /// A timed phase (breakdown, jam, execute) finished
    TimerElapsed,
    /// A buffer handed a unit to the waiting station
    InputDelivered(MaterialUnit),
    /// A full buffer accepted the station's parked unit
    OutputAccepted,
}

/// What a suspended station is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Awaiting {
    Input,
    Space,
    Timer,
}

/// Result of running one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Done,
    Wait(Awaiting),
}

/// Scratch state of one cycle, cleared when the cycle ends
#[derive(Debug, Clone, Default)]
pub struct PhaseContext {
    pub inputs: Vec<MaterialUnit>,
    pub output: Option<MaterialUnit>,
    pub destination: Option<BufferId>,
    pub new_defect: bool,
}

impl PhaseContext {
    pub fn clear(&mut self) {
        self.inputs.clear();
        self.output = None;
        self.destination = None;
        self.new_defect = false;
    }
}
