//! Combined transit + walking graph

use std::fmt;

use geo::{Coord, Line, Point};
use hashbrown::HashMap;
use petgraph::Undirected;
use petgraph::graph::{EdgeReference, Edges, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::Minutes;

/// Hashable identity of a raw network coordinate.
///
/// Two vertices are the same node only if their coordinates are bit-for-bit
/// equal (`-0.0` is folded into `0.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    x: u64,
    y: u64,
}

impl VertexKey {
    pub fn new(coord: Coord<f64>) -> Self {
        // `+ 0.0` turns -0.0 into 0.0
        Self {
            x: (coord.x + 0.0).to_bits(),
            y: (coord.y + 0.0).to_bits(),
        }
    }

    pub fn coord(&self) -> Coord<f64> {
        Coord {
            x: f64::from_bits(self.x),
            y: f64::from_bits(self.y),
        }
    }
}

/// Graph vertex identity. The three variants never collide with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    NetworkVertex(VertexKey),
    Station(usize),
    Point(usize),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::NetworkVertex(key) => {
                let coord = key.coord();
                write!(f, "({}, {})", coord.x, coord.y)
            }
            NodeId::Station(idx) => write!(f, "station_{idx}"),
            NodeId::Point(idx) => write!(f, "point_{idx}"),
        }
    }
}

/// Category of a graph edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Consecutive coordinates of a network polyline, network speed
    Transit,
    /// Station to its nearest network vertex, fixed near-zero weight
    Boarding,
    /// Point to one of its nearest stations, walking speed
    PointToStation,
    /// Point to one of its nearest points, walking speed
    PointToPoint,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Transit => "transit",
            EdgeKind::Boarding => "boarding",
            EdgeKind::PointToStation => "point_station",
            EdgeKind::PointToPoint => "point_point",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GraphNode {
    pub id: NodeId,
    pub geometry: Point<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct GraphEdge {
    /// Travel time in minutes
    pub weight: Minutes,
    pub kind: EdgeKind,
}

/// Flattened edge for export and inspection
#[derive(Debug, Clone, Copy)]
pub struct EdgeRecord {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub time_min: Minutes,
    pub geometry: Line<f64>,
}

/// Undirected weighted multimodal graph.
///
/// Simple graph: adding an edge that already exists keeps the smaller weight.
#[derive(Debug, Clone, Default)]
pub struct MultimodalGraph {
    pub(crate) graph: UnGraph<GraphNode, GraphEdge>,
    index: HashMap<NodeId, NodeIndex>,
    points: Vec<NodeIndex>,
    stations: Vec<NodeIndex>,
}

impl MultimodalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for `id`, inserting it at `geometry` if it is new.
    pub fn add_node(&mut self, id: NodeId, geometry: Point<f64>) -> NodeIndex {
        if let Some(&idx) = self.index.get(&id) {
            return idx;
        }
        let idx = self.graph.add_node(GraphNode { id, geometry });
        self.index.insert(id, idx);
        match id {
            NodeId::Point(i) => register(&mut self.points, i, idx),
            NodeId::Station(i) => register(&mut self.stations, i, idx),
            NodeId::NetworkVertex(_) => {}
        }
        idx
    }

    pub fn add_network_vertex(&mut self, coord: Coord<f64>) -> NodeIndex {
        self.add_node(NodeId::NetworkVertex(VertexKey::new(coord)), coord.into())
    }

    /// Adds an undirected edge. Self loops are ignored.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, weight: Minutes, kind: EdgeKind) {
        debug_assert!(weight.is_finite() && weight >= 0.0, "bad edge weight {weight}");
        if a == b {
            return;
        }
        match self.graph.find_edge(a, b) {
            Some(edge) => {
                let existing = &mut self.graph[edge];
                if weight < existing.weight {
                    *existing = GraphEdge { weight, kind };
                }
            }
            None => {
                self.graph.add_edge(a, b, GraphEdge { weight, kind });
            }
        }
    }

    pub fn node_index(&self, id: &NodeId) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Graph node of the `i`-th input point
    pub fn point_node(&self, i: usize) -> Option<NodeIndex> {
        self.points.get(i).copied().filter(|idx| *idx != NodeIndex::end())
    }

    pub fn station_node(&self, i: usize) -> Option<NodeIndex> {
        self.stations.get(i).copied().filter(|idx| *idx != NodeIndex::end())
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Edges incident to `node`
    pub fn edges(&self, node: NodeIndex) -> Edges<'_, GraphEdge, Undirected> {
        self.graph.edges(node)
    }

    /// Number of edges of `kind` incident to `node`
    pub fn degree_of_kind(&self, node: NodeIndex, kind: EdgeKind) -> usize {
        self.graph
            .edges(node)
            .filter(|edge| edge.weight().kind == kind)
            .count()
    }

    /// Nodes that are raw network coordinates, with their index
    pub fn network_vertices(&self) -> impl Iterator<Item = (NodeIndex, Coord<f64>)> + '_ {
        self.graph.node_indices().filter_map(|idx| match self.graph[idx].id {
            NodeId::NetworkVertex(key) => Some((idx, key.coord())),
            _ => None,
        })
    }

    /// Every edge with its endpoint identities and a straight-line geometry
    pub fn edge_records(&self) -> impl Iterator<Item = EdgeRecord> + '_ {
        self.graph.edge_references().map(|edge| self.edge_record(edge))
    }

    fn edge_record(&self, edge: EdgeReference<'_, GraphEdge>) -> EdgeRecord {
        let from = &self.graph[edge.source()];
        let to = &self.graph[edge.target()];
        EdgeRecord {
            from: from.id,
            to: to.id,
            kind: edge.weight().kind,
            time_min: edge.weight().weight,
            geometry: Line::new(from.geometry, to.geometry),
        }
    }
}

fn register(slots: &mut Vec<NodeIndex>, i: usize, idx: NodeIndex) {
    if slots.len() <= i {
        slots.resize(i + 1, NodeIndex::end());
    }
    slots[i] = idx;
}
