use crate::behavior::BehaviorDefinition;
use crate::config::{ConcurrencyMode, ReplicationConfig, RunConfig, SourceConfig, StationConfig};
use crate::core::buffer::BufferSnapshot;
use crate::core::errors::{Result, SimError};
use crate::equipment::StationReport;
use crate::simulation::{ProductionRecord, RunSummary, Simulation, StateChange};
use crate::topology::TopologyGraph;
use log::info;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

/// Everything needed to build a line, shareable across replications
#[derive(Debug, Clone)]
pub struct LineDefinition {
    pub topology: TopologyGraph,
    pub stations: Vec<StationConfig>,
    pub behavior: BehaviorDefinition,
    pub source: SourceConfig,
}

impl LineDefinition {
    /// Linear line fed by an inexhaustible source, using the standard behavior
    pub fn linear(stations: Vec<StationConfig>) -> Result<Self> {
        let topology = TopologyGraph::linear(&stations)?;
        Ok(Self {
            topology,
            stations,
            behavior: BehaviorDefinition::standard(),
            source: SourceConfig::default(),
        })
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    pub fn with_behavior(mut self, behavior: BehaviorDefinition) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn build(&self, seed: u64) -> Result<Simulation> {
        Simulation::build_with_source(&self.topology, &self.stations, &self.behavior, self.source.clone(), seed)
    }
}

/// Result of running one seed to the horizon
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationOutcome {
    pub seed: u64,
    pub summary: RunSummary,
    pub stations: Vec<StationReport>,
    pub buffers: Vec<BufferSnapshot>,
    pub state_changes: Vec<StateChange>,
    pub production: Vec<ProductionRecord>,
}

impl ReplicationOutcome {
    pub fn station(&self, name: &str) -> Option<&StationReport> {
        self.stations.iter().find(|report| report.name == name)
    }
}

fn run_one(line: &LineDefinition, run: &RunConfig, seed: u64) -> Result<ReplicationOutcome> {
    let mut simulation = line.build(seed)?;
    let summary = simulation.run(run.horizon_sec)?;
    Ok(ReplicationOutcome {
        seed,
        summary,
        stations: simulation.station_reports(),
        buffers: simulation.buffer_snapshots(),
        state_changes: simulation.drain_state_changes(),
        production: simulation.drain_production(),
    })
}

/// Run one independent simulation per seed. Outcomes are returned in seed
/// order and do not depend on the concurrency mode.
pub fn run_replications(
    line: &LineDefinition,
    run: &RunConfig,
    replications: &ReplicationConfig,
) -> Result<Vec<ReplicationOutcome>> {
    run.validate()?;
    info!(
        "Running {} replications of '{}' ({:?})",
        replications.seeds.len(),
        run.name,
        replications.concurrency_mode
    );

    match replications.concurrency_mode {
        ConcurrencyMode::Sequential => replications
            .seeds
            .iter()
            .map(|&seed| run_one(line, run, seed))
            .collect(),
        ConcurrencyMode::Rayon => {
            let pool = ThreadPoolBuilder::new()
                .num_threads(replications.thread_pool_size.unwrap_or(0))
                .build()
                .map_err(|error| SimError::configuration("replications", format!("thread pool: {}", error)))?;
            pool.install(|| {
                replications
                    .seeds
                    .par_iter()
                    .map(|&seed| run_one(line, run, seed))
                    .collect()
            })
        }
    }
}
