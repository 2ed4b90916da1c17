use crate::core::material::MaterialUnit;
use crate::core::types::SimTime;
use crate::equipment::StationState;
use serde::{Deserialize, Serialize};

/// One entry of the state-change stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub time: SimTime,
    pub station: String,
    pub new_state: StationState,
    /// `None` for the initial record of each station
    pub previous_state: Option<StationState>,
    /// Reason for the transition, e.g. `waiting_for_input` or `breakdown`
    pub label: String,
    pub duration_in_previous_state: SimTime,
}

/// One entry of the production stream, emitted when a station builds its output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub time: SimTime,
    pub station: String,
    pub unit: MaterialUnit,
    /// The station itself introduced the defect (as opposed to inheriting it)
    pub new_defect: bool,
}
