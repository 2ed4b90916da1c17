use serde::{Deserialize, Serialize};

/// Simulated time in seconds since the start of a run
pub type SimTime = f64;

/// Handle of an equipment process registered on a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessId(pub(crate) usize);

impl ProcessId {
    /// Create a process handle from its registration index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the registration index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Handle of a buffer owned by a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BufferId(pub(crate) usize);

impl BufferId {
    /// Create a buffer handle from its creation index
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the creation index
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}", self.0)
    }
}
