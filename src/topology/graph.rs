use super::order::BuildOrder;
use super::routing::RoutePredicate;
use crate::config::StationConfig;
use crate::core::errors::{Result, SimError};
use crate::core::material::MaterialKind;
use std::collections::HashMap;

/// Virtual node supplying raw material
pub const SOURCE: &str = "_source";
/// Virtual node collecting finished goods
pub const SINK: &str = "_sink";
/// Virtual node collecting rejected units
pub const REJECT: &str = "_reject";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Station,
    Source,
    Sink,
    Reject,
}

impl NodeKind {
    /// Classify a node name; virtual names are reserved
    pub fn of(name: &str) -> NodeKind {
        match name {
            SOURCE => NodeKind::Source,
            SINK => NodeKind::Sink,
            REJECT => NodeKind::Reject,
            _ => NodeKind::Station,
        }
    }

    pub fn is_virtual(&self) -> bool {
        !matches!(self, NodeKind::Station)
    }
}

/// A real station in the graph
#[derive(Debug, Clone, PartialEq)]
pub struct StationNode {
    pub name: String,
    pub batch_in: usize,
    pub output_kind: Option<MaterialKind>,
}

impl StationNode {
    pub fn new(name: impl Into<String>, batch_in: usize, output_kind: Option<MaterialKind>) -> Self {
        Self {
            name: name.into(),
            batch_in,
            output_kind,
        }
    }

    pub fn from_config(config: &StationConfig) -> Self {
        Self::new(config.name.clone(), config.batch_in, config.output_kind)
    }
}

/// Directed buffer connection between two nodes
#[derive(Debug, Clone)]
pub struct BufferEdge {
    pub from: String,
    pub to: String,
    /// Overrides the upstream station's buffer capacity
    pub capacity: Option<usize>,
    /// `None` marks a default edge
    pub condition: Option<RoutePredicate>,
}

impl BufferEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            capacity: None,
            condition: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_condition(mut self, condition: RoutePredicate) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn is_default(&self) -> bool {
        self.condition.is_none()
    }
}

/// Stations and buffer edges of a line, including the virtual source, sink and reject nodes.
///
/// Stations keep their declaration order, which makes ordering and error
/// reports deterministic.
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    stations: Vec<StationNode>,
    station_index: HashMap<String, usize>,
    edges: Vec<BufferEdge>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain `_source -> s1 -> ... -> sN -> _sink`
    pub fn linear(stations: &[StationConfig]) -> Result<Self> {
        if stations.is_empty() {
            return Err(SimError::configuration("topology", "a linear line needs at least one station"));
        }
        let mut graph = Self::new();
        for config in stations {
            graph.add_node(StationNode::from_config(config))?;
        }
        let mut previous = SOURCE.to_string();
        for config in stations {
            graph.add_edge(BufferEdge::new(previous, config.name.clone()))?;
            previous = config.name.clone();
        }
        graph.add_edge(BufferEdge::new(previous, SINK))?;
        Ok(graph)
    }

    pub fn add_node(&mut self, node: StationNode) -> Result<()> {
        if node.name.trim().is_empty() {
            return Err(SimError::configuration("topology", "station name must not be empty"));
        }
        if NodeKind::of(&node.name).is_virtual() {
            return Err(SimError::configuration(
                "topology",
                format!("'{}' is a reserved virtual node name", node.name),
            ));
        }
        if self.station_index.contains_key(&node.name) {
            return Err(SimError::configuration(
                "topology",
                format!("station '{}' declared twice", node.name),
            ));
        }
        self.station_index.insert(node.name.clone(), self.stations.len());
        self.stations.push(node);
        Ok(())
    }

    /// Add a directed edge. Virtual endpoints need no declaration.
    pub fn add_edge(&mut self, edge: BufferEdge) -> Result<()> {
        if edge.from == edge.to {
            return Err(SimError::configuration(
                "topology",
                format!("self-loop on '{}'", edge.from),
            ));
        }
        for endpoint in [&edge.from, &edge.to] {
            if !NodeKind::of(endpoint).is_virtual() && !self.station_index.contains_key(endpoint) {
                return Err(SimError::unknown_node(endpoint.clone()));
            }
        }
        if NodeKind::of(&edge.from).is_virtual() && NodeKind::of(&edge.to).is_virtual() {
            return Err(SimError::configuration(
                "topology",
                format!("edge {} -> {} connects two virtual nodes", edge.from, edge.to),
            ));
        }
        if self.edges.iter().any(|existing| existing.from == edge.from && existing.to == edge.to) {
            return Err(SimError::configuration(
                "topology",
                format!("duplicate edge {} -> {}", edge.from, edge.to),
            ));
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn stations(&self) -> &[StationNode] {
        &self.stations
    }

    pub fn station(&self, name: &str) -> Option<&StationNode> {
        self.station_index.get(name).map(|&index| &self.stations[index])
    }

    pub fn contains(&self, name: &str) -> bool {
        NodeKind::of(name).is_virtual() || self.station_index.contains_key(name)
    }

    pub fn edges(&self) -> &[BufferEdge] {
        &self.edges
    }

    /// Inbound edges of `name`, in declaration order
    pub fn upstream(&self, name: &str) -> Vec<&BufferEdge> {
        self.edges.iter().filter(|edge| edge.to == name).collect()
    }

    /// Outbound edges of `name`, in declaration order
    pub fn downstream(&self, name: &str) -> Vec<&BufferEdge> {
        self.edges.iter().filter(|edge| edge.from == name).collect()
    }

    /// Check the graph can be built into a runnable layout
    pub fn validate(&self) -> Result<()> {
        for edge in &self.edges {
            if NodeKind::of(&edge.to) == NodeKind::Source {
                return Err(SimError::configuration(
                    "topology",
                    format!("edge {} -> {} flows into the source", edge.from, edge.to),
                ));
            }
            if matches!(NodeKind::of(&edge.from), NodeKind::Sink | NodeKind::Reject) {
                return Err(SimError::configuration(
                    "topology",
                    format!("edge {} -> {} leaves a terminal node", edge.from, edge.to),
                ));
            }
        }

        for station in &self.stations {
            if self.upstream(&station.name).is_empty() {
                return Err(SimError::configuration(
                    format!("station '{}'", station.name),
                    "has no inbound edge",
                ));
            }
            if self.downstream(&station.name).is_empty() {
                return Err(SimError::configuration(
                    format!("station '{}'", station.name),
                    "has no outbound edge",
                ));
            }
        }

        for station in &self.stations {
            let defaults: Vec<&str> = self
                .downstream(&station.name)
                .into_iter()
                .filter(|edge| edge.is_default())
                .map(|edge| edge.to.as_str())
                .collect();
            if defaults.len() > 1 {
                return Err(SimError::configuration(
                    format!("station '{}'", station.name),
                    format!("competing default edges to {}", defaults.join(", ")),
                ));
            }
        }

        self.station_order().map(|_| ())
    }

    /// Station names such that every edge's source precedes its target
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.validate()?;
        let order = self.station_order()?;
        Ok(order.into_iter().map(|index| self.stations[index].name.clone()).collect())
    }

    fn station_order(&self) -> Result<Vec<usize>> {
        let station_edges: Vec<(usize, usize)> = self
            .edges
            .iter()
            .filter_map(|edge| {
                let from = self.station_index.get(&edge.from)?;
                let to = self.station_index.get(&edge.to)?;
                Some((*from, *to))
            })
            .collect();

        BuildOrder::order(self.stations.len(), &station_edges).map_err(|remainder| SimError::CycleDetected {
            nodes: remainder
                .stations
                .into_iter()
                .map(|index| self.stations[index].name.clone())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> StationNode {
        StationNode::new(name, 1, None)
    }

    fn graph_with(names: &[&str]) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        for name in names {
            graph.add_node(node(name)).unwrap();
        }
        graph
    }

    #[test]
    fn test_linear_chain() {
        let stations = vec![StationConfig::new("Filler", 3600), StationConfig::new("Packer", 300)];
        let graph = TopologyGraph::linear(&stations).unwrap();
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.upstream("Filler")[0].from, SOURCE);
        assert_eq!(graph.downstream("Packer")[0].to, SINK);
        assert_eq!(graph.topological_order().unwrap(), vec!["Filler", "Packer"]);
    }

    #[test]
    fn test_add_node_rejects_duplicates_and_reserved_names() {
        let mut graph = graph_with(&["A"]);
        assert!(matches!(graph.add_node(node("A")), Err(SimError::Configuration { .. })));
        assert!(matches!(graph.add_node(node(SINK)), Err(SimError::Configuration { .. })));
    }

    #[test]
    fn test_add_edge_rejects_unknown_station_and_self_loop() {
        let mut graph = graph_with(&["A"]);
        assert_eq!(
            graph.add_edge(BufferEdge::new("A", "Ghost")),
            Err(SimError::UnknownNode { name: "Ghost".to_string() })
        );
        assert!(matches!(graph.add_edge(BufferEdge::new("A", "A")), Err(SimError::Configuration { .. })));
    }

    #[test]
    fn test_topological_order_branch_and_merge() {
        let mut graph = graph_with(&["Pack", "Fill", "Cap", "Label"]);
        graph.add_edge(BufferEdge::new(SOURCE, "Fill")).unwrap();
        graph.add_edge(BufferEdge::new("Fill", "Cap")).unwrap();
        graph
            .add_edge(BufferEdge::new("Fill", "Label").with_condition(RoutePredicate::IsDefective))
            .unwrap();
        graph.add_edge(BufferEdge::new("Cap", "Pack")).unwrap();
        graph.add_edge(BufferEdge::new("Label", "Pack")).unwrap();
        graph.add_edge(BufferEdge::new("Pack", SINK)).unwrap();

        let order = graph.topological_order().unwrap();
        let position = |name: &str| order.iter().position(|n| n == name).unwrap();
        for edge in graph.edges() {
            if graph.station(&edge.from).is_some() && graph.station(&edge.to).is_some() {
                assert!(position(&edge.from) < position(&edge.to));
            }
        }
        assert_eq!(order[0], "Fill");
        assert_eq!(order[3], "Pack");
    }

    #[test]
    fn test_validate_detects_cycle() {
        let mut graph = graph_with(&["A", "B", "C"]);
        graph.add_edge(BufferEdge::new(SOURCE, "A")).unwrap();
        graph.add_edge(BufferEdge::new("A", "B")).unwrap();
        graph
            .add_edge(BufferEdge::new("B", "C").with_condition(RoutePredicate::IsGood))
            .unwrap();
        graph.add_edge(BufferEdge::new("C", "B")).unwrap();
        graph.add_edge(BufferEdge::new("B", SINK)).unwrap();

        assert_eq!(
            graph.validate(),
            Err(SimError::CycleDetected {
                nodes: vec!["B".to_string(), "C".to_string()]
            })
        );
    }

    #[test]
    fn test_validate_rejects_dangling_station() {
        let mut graph = graph_with(&["A", "B"]);
        graph.add_edge(BufferEdge::new(SOURCE, "A")).unwrap();
        graph.add_edge(BufferEdge::new("A", SINK)).unwrap();
        assert!(matches!(graph.validate(), Err(SimError::Configuration { context, .. }) if context.contains("'B'")));
    }

    #[test]
    fn test_validate_rejects_competing_defaults() {
        let mut graph = graph_with(&["A", "B"]);
        graph.add_edge(BufferEdge::new(SOURCE, "A")).unwrap();
        graph.add_edge(BufferEdge::new("A", "B")).unwrap();
        graph.add_edge(BufferEdge::new("A", SINK)).unwrap();
        graph.add_edge(BufferEdge::new("B", SINK)).unwrap();
        assert!(matches!(graph.validate(), Err(SimError::Configuration { message, .. }) if message.contains("competing")));
    }

    #[test]
    fn test_validate_rejects_flow_out_of_terminal() {
        let mut graph = graph_with(&["A"]);
        graph.add_edge(BufferEdge::new(SOURCE, "A")).unwrap();
        graph.add_edge(BufferEdge::new("A", SINK)).unwrap();
        graph.add_edge(BufferEdge::new(REJECT, "A")).unwrap();
        assert!(matches!(graph.validate(), Err(SimError::Configuration { .. })));
    }
}
