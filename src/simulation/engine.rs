use super::layout::{Layout, LayoutBuilder};
use super::records::{ProductionRecord, StateChange};
use super::world::World;
use crate::behavior::BehaviorDefinition;
use crate::config::{SourceConfig, StationConfig};
use crate::core::buffer::BufferSnapshot;
use crate::core::errors::{Result, SimError};
use crate::core::types::{BufferId, SimTime};
use crate::equipment::{EquipmentProcess, StationReport};
use crate::topology::TopologyGraph;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;

/// Outcome of one call to `Simulation::run`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub until: SimTime,
    /// Resumptions processed by this call
    pub events_processed: u64,
    /// Resumptions still queued past the horizon
    pub pending_events: usize,
}

/// A line ready to be driven by the event loop
pub struct Simulation {
    world: World,
    processes: Vec<EquipmentProcess>,
    station_index: HashMap<String, usize>,
    started: bool,
    failure: Option<SimError>,
    total_events: u64,
}

impl Simulation {
    /// Build a line fed by an inexhaustible raw-material source
    pub fn build(
        topology: &TopologyGraph,
        configs: &[StationConfig],
        behavior: &BehaviorDefinition,
        seed: u64,
    ) -> Result<Self> {
        Self::build_with_source(topology, configs, behavior, SourceConfig::default(), seed)
    }

    pub fn build_with_source(
        topology: &TopologyGraph,
        configs: &[StationConfig],
        behavior: &BehaviorDefinition,
        source: SourceConfig,
        seed: u64,
    ) -> Result<Self> {
        let layout = LayoutBuilder::new(topology, configs, behavior).with_source(source).build()?;
        Ok(Self::from_layout(layout, seed))
    }

    pub fn from_layout(layout: Layout, seed: u64) -> Self {
        let terminals = layout.terminals();
        let Layout {
            processes,
            buffers,
            supply,
            ..
        } = layout;
        let station_index = processes
            .iter()
            .enumerate()
            .map(|(position, process)| (process.station().name().to_string(), position))
            .collect();
        Self {
            world: World::new(buffers, supply, terminals, seed),
            processes,
            station_index,
            started: false,
            failure: None,
            total_events: 0,
        }
    }

    pub fn now(&self) -> SimTime {
        self.world.now()
    }

    /// Total resumptions processed since the first run
    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// Process every event due at or before `until`, then move the clock to `until`.
    ///
    /// A routing ambiguity aborts the run; the same error is returned by every later call.
    pub fn run(&mut self, until: SimTime) -> Result<RunSummary> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        if until.is_nan() {
            return Err(SimError::configuration("run", "horizon must be a number"));
        }
        if !self.started {
            self.start();
        }

        let mut events_processed = 0u64;
        while let Some((time, resumption)) = self.world.scheduler_mut().pop_due(until) {
            events_processed += 1;
            let Some(process) = self.processes.get_mut(resumption.process.index()) else {
                debug!("Dropping resumption for unknown process {} at t={:.3}", resumption.process, time);
                continue;
            };
            if let Err(error) = process.resume(resumption.signal, &mut self.world) {
                self.total_events += events_processed;
                self.failure = Some(error.clone());
                return Err(error);
            }
        }
        self.world.scheduler_mut().advance_to(until);
        self.total_events += events_processed;

        let summary = RunSummary {
            until: self.world.now(),
            events_processed,
            pending_events: self.world.pending_events(),
        };
        info!(
            "Run reached t={:.3}: {} events processed, {} pending",
            summary.until, summary.events_processed, summary.pending_events
        );
        Ok(summary)
    }

    fn start(&mut self) {
        for process in &self.processes {
            process.station().announce(&mut self.world);
            self.world.schedule_start(process.id());
        }
        self.started = true;
    }

    /// Take every state change recorded since the last drain
    pub fn drain_state_changes(&mut self) -> Vec<StateChange> {
        self.world.drain_state_changes()
    }

    /// Take every production record since the last drain
    pub fn drain_production(&mut self) -> Vec<ProductionRecord> {
        self.world.drain_production()
    }

    pub fn buffer_snapshots(&self) -> Vec<BufferSnapshot> {
        self.world.buffers().iter().map(|buffer| buffer.snapshot()).collect()
    }

    pub fn buffer(&self, id: BufferId) -> Option<BufferSnapshot> {
        self.world.buffer(id).map(|buffer| buffer.snapshot())
    }

    pub fn source_buffer(&self) -> BufferId {
        self.world.source_buffer()
    }

    pub fn sink_buffer(&self) -> BufferId {
        self.world.sink_buffer()
    }

    pub fn reject_buffer(&self) -> BufferId {
        self.world.reject_buffer()
    }

    pub fn station(&self, name: &str) -> Option<&EquipmentProcess> {
        self.station_index.get(name).and_then(|&index| self.processes.get(index))
    }

    pub fn processes(&self) -> &[EquipmentProcess] {
        &self.processes
    }

    pub fn station_report(&self, name: &str) -> Option<StationReport> {
        self.station(name).map(|process| process.report(self.now()))
    }

    /// Reports for every station, in build order
    pub fn station_reports(&self) -> Vec<StationReport> {
        let now = self.now();
        self.processes.iter().map(|process| process.report(now)).collect()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::material::MaterialKind;
    use crate::equipment::StationState;

    fn single_station(config: StationConfig) -> Simulation {
        let configs = vec![config];
        let topology = TopologyGraph::linear(&configs).unwrap();
        Simulation::build(&topology, &configs, &BehaviorDefinition::standard(), 1).unwrap()
    }

    #[test]
    fn test_initial_records_and_clock() {
        let mut simulation = single_station(StationConfig::new("Solo", 3600));
        let summary = simulation.run(10.0).unwrap();
        assert_eq!(summary.until, 10.0);
        assert_eq!(simulation.now(), 10.0);

        let changes = simulation.drain_state_changes();
        assert_eq!(changes[0].previous_state, None);
        assert_eq!(changes[0].new_state, StationState::Starved);
        assert_eq!(changes[0].time, 0.0);
        assert_eq!(changes[1].new_state, StationState::Execute);
        assert!(simulation.drain_state_changes().is_empty(), "drain empties the stream");
    }

    #[test]
    fn test_repeated_runs_continue_the_timeline() {
        let mut simulation = single_station(StationConfig::new("Solo", 3600));
        simulation.run(5.0).unwrap();
        simulation.run(10.0).unwrap();
        let report = simulation.station_report("Solo").unwrap();
        assert_eq!(report.counters.units_produced, 10);
        assert!((report.time_in_state.total() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_exhaustion_leaves_station_starved() {
        let configs = vec![StationConfig::new("Solo", 3600)];
        let topology = TopologyGraph::linear(&configs).unwrap();
        let source = SourceConfig::default().with_inventory(3).with_material(MaterialKind::Tube, "Tubes");
        let mut simulation =
            Simulation::build_with_source(&topology, &configs, &BehaviorDefinition::standard(), source, 1).unwrap();
        simulation.run(50.0).unwrap();

        let report = simulation.station_report("Solo").unwrap();
        assert_eq!(report.counters.units_produced, 3);
        assert_eq!(report.state, StationState::Starved);
        let production = simulation.drain_production();
        assert!(production.iter().all(|record| record.unit.created_by() == "Tubes"));
        assert_eq!(simulation.buffer(simulation.sink_buffer()).unwrap().occupancy, 3);
    }

    #[test]
    fn test_routing_ambiguity_aborts_run() {
        use crate::topology::{BufferEdge, RoutePredicate, StationNode, SINK, SOURCE};

        let configs = vec![StationConfig::new("QC", 3600)];
        let mut topology = TopologyGraph::new();
        topology.add_node(StationNode::from_config(&configs[0])).unwrap();
        topology.add_edge(BufferEdge::new(SOURCE, "QC")).unwrap();
        topology
            .add_edge(BufferEdge::new("QC", SINK).with_condition(RoutePredicate::IsDefective))
            .unwrap();

        let mut simulation = Simulation::build(&topology, &configs, &BehaviorDefinition::standard(), 1).unwrap();
        let first = simulation.run(5.0);
        assert!(matches!(first, Err(SimError::RoutingAmbiguity { ref station, .. }) if station == "QC"));
        assert!(simulation.is_failed());
        assert_eq!(simulation.run(10.0).err(), first.err());
    }
}
