use super::world::SourceSupply;
use crate::behavior::BehaviorDefinition;
use crate::config::{SourceConfig, StationConfig};
use crate::core::buffer::Buffer;
use crate::core::errors::{Result, SimError};
use crate::core::types::{BufferId, ProcessId};
use crate::equipment::{EquipmentProcess, StationPorts, StationRuntime};
use crate::topology::{NodeKind, Route, Router, StationNode, TopologyGraph, REJECT, SINK, SOURCE};
use log::{info, warn};
use std::collections::HashMap;

/// Buffers and processes wired from a validated topology, ready to be run
#[derive(Debug)]
pub struct Layout {
    pub(crate) processes: Vec<EquipmentProcess>,
    pub(crate) buffers: Vec<Buffer>,
    pub(crate) supply: SourceSupply,
    source: BufferId,
    sink: BufferId,
    reject: BufferId,
    station_index: HashMap<String, ProcessId>,
    edge_buffers: Vec<(String, String, BufferId)>,
}

impl Layout {
    pub fn processes(&self) -> &[EquipmentProcess] {
        &self.processes
    }

    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    pub fn source_buffer(&self) -> BufferId {
        self.source
    }

    pub fn sink_buffer(&self) -> BufferId {
        self.sink
    }

    pub fn reject_buffer(&self) -> BufferId {
        self.reject
    }

    pub fn station(&self, name: &str) -> Option<ProcessId> {
        self.station_index.get(name).copied()
    }

    /// Buffer serving the edge `from -> to`
    pub fn edge_buffer(&self, from: &str, to: &str) -> Option<BufferId> {
        self.edge_buffers
            .iter()
            .find(|(edge_from, edge_to, _)| edge_from == from && edge_to == to)
            .map(|(_, _, buffer)| *buffer)
    }

    pub(crate) fn terminals(&self) -> (BufferId, BufferId, BufferId) {
        (self.source, self.sink, self.reject)
    }
}

/// Builder for constructing a Layout from a topology, station configurations and a behavior
pub struct LayoutBuilder<'a> {
    topology: &'a TopologyGraph,
    configs: &'a [StationConfig],
    behavior: &'a BehaviorDefinition,
    source: SourceConfig,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(topology: &'a TopologyGraph, configs: &'a [StationConfig], behavior: &'a BehaviorDefinition) -> Self {
        Self {
            topology,
            configs,
            behavior,
            source: SourceConfig::default(),
        }
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.source = source;
        self
    }

    /// Validate all inputs and wire one buffer per edge and one process per station
    pub fn build(self) -> Result<Layout> {
        self.source.validate()?;
        let configs = self.index_configs()?;
        let order = self.topology.topological_order()?;

        let mut buffers = vec![
            Buffer::unbounded(BufferId::new(0), SOURCE),
            Buffer::unbounded(BufferId::new(1), SINK),
            Buffer::unbounded(BufferId::new(2), REJECT),
        ];
        let (source, sink, reject) = (BufferId::new(0), BufferId::new(1), BufferId::new(2));
        let mut edge_buffers: Vec<(String, String, BufferId)> = Vec::new();

        for name in &order {
            let config = lookup(&configs, name)?;
            for edge in self.topology.downstream(name) {
                let buffer = match NodeKind::of(&edge.to) {
                    NodeKind::Station => {
                        let capacity = edge.capacity.unwrap_or(config.buffer_capacity);
                        if capacity < 1 {
                            return Err(SimError::configuration(
                                format!("edge {} -> {}", edge.from, edge.to),
                                "capacity override must be at least 1",
                            ));
                        }
                        let id = BufferId::new(buffers.len());
                        buffers.push(Buffer::bounded(id, format!("Buf_{}_to_{}", edge.from, edge.to), capacity));
                        id
                    }
                    kind => {
                        if let Some(capacity) = edge.capacity {
                            warn!(
                                "Ignoring capacity override {} on edge {} -> {}: virtual buffers are unbounded",
                                capacity, edge.from, edge.to
                            );
                        }
                        if kind == NodeKind::Reject {
                            reject
                        } else {
                            sink
                        }
                    }
                };
                edge_buffers.push((edge.from.clone(), edge.to.clone(), buffer));
            }
        }

        let mut processes = Vec::with_capacity(order.len());
        let mut station_index = HashMap::new();
        for (position, name) in order.iter().enumerate() {
            let config = lookup(&configs, name)?;
            let id = ProcessId::new(position);

            let mut upstream = Vec::new();
            for edge in self.topology.upstream(name) {
                if edge.capacity.is_some() && edge.from == SOURCE {
                    warn!(
                        "Ignoring capacity override on edge {} -> {}: virtual buffers are unbounded",
                        edge.from, edge.to
                    );
                }
                let buffer = if edge.from == SOURCE {
                    source
                } else {
                    find_edge(&edge_buffers, &edge.from, &edge.to)?
                };
                upstream.push(buffer);
            }

            let mut routes = Vec::new();
            for edge in self.topology.downstream(name) {
                routes.push(Route {
                    target: edge.to.clone(),
                    buffer: find_edge(&edge_buffers, &edge.from, &edge.to)?,
                    predicate: edge.condition.clone(),
                });
            }

            let resolved = self.behavior.resolve(config)?;
            let ports = StationPorts::new(upstream, Router::new(name.clone(), routes), reject);
            let runtime = StationRuntime::new(id, config.clone(), ports);
            processes.push(EquipmentProcess::new(runtime, resolved));
            station_index.insert(name.clone(), id);
        }

        info!(
            "Layout built: {} stations, {} buffers ({} station-to-station)",
            processes.len(),
            buffers.len(),
            buffers.len() - 3
        );

        Ok(Layout {
            processes,
            buffers,
            supply: SourceSupply::from_config(&self.source),
            source,
            sink,
            reject,
            station_index,
            edge_buffers,
        })
    }

    /// Index configurations by name and check them against the graph
    fn index_configs(&self) -> Result<HashMap<&'a str, &'a StationConfig>> {
        let mut configs: HashMap<&'a str, &'a StationConfig> = HashMap::new();
        for config in self.configs {
            config.validate()?;
            if configs.insert(config.name.as_str(), config).is_some() {
                return Err(SimError::configuration(
                    format!("station '{}'", config.name),
                    "configured twice",
                ));
            }
            if self.topology.station(&config.name).is_none() {
                return Err(SimError::unknown_node(config.name.clone()));
            }
        }

        for node in self.topology.stations() {
            let config = configs.get(node.name.as_str()).ok_or_else(|| {
                SimError::configuration(format!("station '{}'", node.name), "no configuration provided")
            })?;
            let expected = StationNode::from_config(config);
            if expected.batch_in != node.batch_in || expected.output_kind != node.output_kind {
                return Err(SimError::configuration(
                    format!("station '{}'", node.name),
                    format!(
                        "graph node (batch_in {}, output {:?}) disagrees with configuration (batch_in {}, output {:?})",
                        node.batch_in, node.output_kind, expected.batch_in, expected.output_kind
                    ),
                ));
            }
        }
        Ok(configs)
    }
}

fn lookup<'c>(configs: &HashMap<&str, &'c StationConfig>, name: &str) -> Result<&'c StationConfig> {
    configs
        .get(name)
        .copied()
        .ok_or_else(|| SimError::configuration(format!("station '{}'", name), "no configuration provided"))
}

fn find_edge(edge_buffers: &[(String, String, BufferId)], from: &str, to: &str) -> Result<BufferId> {
    edge_buffers
        .iter()
        .find(|(edge_from, edge_to, _)| edge_from == from && edge_to == to)
        .map(|(_, _, buffer)| *buffer)
        .ok_or_else(|| SimError::unknown_node(format!("{} -> {}", from, to)))
}
