use super::{Crs, MultimodalGraph, NetworkSegment, OdPoint, Station};

/// Everything produced by the loading pipeline: the inputs in the working
/// CRS and the graph built from them.
#[derive(Debug, Clone)]
pub struct MultimodalModel {
    /// Working CRS of every geometry below
    pub crs: Crs,
    /// Origin/destination points, in input order
    pub points: Vec<OdPoint>,
    /// Stations used to build the graph, supplied or synthesised
    pub stations: Vec<Station>,
    /// Network after snapping and splitting
    pub network: Vec<NetworkSegment>,
    pub graph: MultimodalGraph,
}

impl MultimodalModel {
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "{} points, {} stations, {} network segments, graph with {} nodes and {} edges ({})",
            self.points.len(),
            self.stations.len(),
            self.network.len(),
            self.graph.node_count(),
            self.graph.edge_count(),
            self.crs
        )
    }
}
