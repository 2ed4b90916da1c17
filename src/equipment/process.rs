use super::state::{StateLedger, StateTimes, StationState};
use crate::behavior::{Orchestrator, ResolvedBehavior, Signal};
use crate::config::StationConfig;
use crate::core::errors::Result;
use crate::core::material::MaterialKind;
use crate::core::types::{BufferId, ProcessId, SimTime};
use crate::simulation::records::StateChange;
use crate::simulation::world::World;
use crate::topology::Router;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Buffers a station reads from and writes to
#[derive(Debug, Clone)]
pub struct StationPorts {
    /// Merge inputs in declaration order
    pub upstream: Vec<BufferId>,
    pub router: Router,
    pub reject: BufferId,
    /// Round-robin position over `upstream`
    pub(crate) cursor: usize,
}

impl StationPorts {
    pub fn new(upstream: Vec<BufferId>, router: Router, reject: BufferId) -> Self {
        Self {
            upstream,
            router,
            reject,
            cursor: 0,
        }
    }
}

/// Running totals of one station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationCounters {
    /// Number of EXECUTE phases entered
    pub cycles_started: u64,
    pub units_consumed: u64,
    pub units_produced: u64,
    pub produced_by_kind: BTreeMap<MaterialKind, u64>,
    pub defects_created: u64,
    pub defects_detected: u64,
    pub defects_escaped: u64,
    /// Units accepted by a downstream station or the sink
    pub forwarded: u64,
    /// Units accepted by the reject buffer
    pub rejected: u64,
}

/// A station's configuration, wiring and bookkeeping
#[derive(Debug, Clone)]
pub struct StationRuntime {
    pub(crate) id: ProcessId,
    pub(crate) config: StationConfig,
    pub(crate) ports: StationPorts,
    pub(crate) ledger: StateLedger,
    pub(crate) counters: StationCounters,
}

impl StationRuntime {
    pub fn new(id: ProcessId, config: StationConfig, ports: StationPorts) -> Self {
        Self {
            id,
            config,
            ports,
            ledger: StateLedger::new(StationState::Starved, 0.0),
            counters: StationCounters::default(),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn state(&self) -> StationState {
        self.ledger.current()
    }

    pub fn counters(&self) -> &StationCounters {
        &self.counters
    }

    pub fn time_in_state(&self, now: SimTime) -> StateTimes {
        self.ledger.time_in_state(now)
    }

    /// Operating cost accrued over `[0, now]`
    pub fn conversion_cost(&self, now: SimTime) -> f64 {
        self.time_in_state(now).total() / 3600.0 * self.config.cost_rates.total_per_hour()
    }

    /// Emit the record every station starts a run with
    pub(crate) fn announce(&self, world: &mut World) {
        world.record_state(StateChange {
            time: world.now(),
            station: self.config.name.clone(),
            new_state: self.ledger.current(),
            previous_state: None,
            label: "initial".to_string(),
            duration_in_previous_state: 0.0,
        });
    }

    /// Move to `state`, recording the change unless it is already current
    pub(crate) fn enter(&mut self, state: StationState, label: &str, world: &mut World) {
        let now = world.now();
        if let Some(transition) = self.ledger.transition(state, now) {
            debug!(
                "[Station {}] {} -> {} at t={:.3}",
                self.config.name, transition.previous, state, now
            );
            world.record_state(StateChange {
                time: now,
                station: self.config.name.clone(),
                new_state: state,
                previous_state: Some(transition.previous),
                label: label.to_string(),
                duration_in_previous_state: transition.duration,
            });
        }
    }
}

/// Snapshot of a station for callers and aggregators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReport {
    pub name: String,
    pub state: StationState,
    pub time_in_state: StateTimes,
    pub counters: StationCounters,
    pub cycle_time_sec: f64,
    pub conversion_cost: f64,
}

/// One persistent cooperative task per station
#[derive(Debug, Clone)]
pub struct EquipmentProcess {
    pub(crate) station: StationRuntime,
    pub(crate) orchestrator: Orchestrator,
}

impl EquipmentProcess {
    pub fn new(station: StationRuntime, behavior: ResolvedBehavior) -> Self {
        Self {
            station,
            orchestrator: Orchestrator::new(behavior),
        }
    }

    pub fn id(&self) -> ProcessId {
        self.station.id
    }

    pub fn station(&self) -> &StationRuntime {
        &self.station
    }

    pub fn behavior(&self) -> &ResolvedBehavior {
        self.orchestrator.behavior()
    }

    /// Drive the station until it next suspends
    pub(crate) fn resume(&mut self, signal: Signal, world: &mut World) -> Result<()> {
        self.orchestrator.resume(signal, &mut self.station, world)
    }

    pub fn report(&self, now: SimTime) -> StationReport {
        StationReport {
            name: self.station.config.name.clone(),
            state: self.station.state(),
            time_in_state: self.station.time_in_state(now),
            counters: self.station.counters.clone(),
            cycle_time_sec: self.station.config.cycle_time_sec(),
            conversion_cost: self.station.conversion_cost(now),
        }
    }
}
