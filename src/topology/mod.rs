pub mod graph;
pub mod order;
pub mod routing;

pub use graph::{BufferEdge, NodeKind, StationNode, TopologyGraph, REJECT, SINK, SOURCE};
pub use order::{BuildOrder, Stage};
pub use routing::{Route, RoutePredicate, Router};
