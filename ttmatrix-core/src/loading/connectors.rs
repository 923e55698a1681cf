//! Assembling the multimodal graph: transit edges, boarding connectors and
//! walking edges.

use geo::{Coord, Euclidean, Length};
use log::{debug, info, trace, warn};

use crate::model::{EdgeKind, MultimodalGraph, NetworkSegment, NodeId, OdPoint, Station};
use crate::spatial::{nearest_k, nearest_k_excluding, point_tree};
use crate::{MatrixConfig, travel_minutes};

/// Builds the combined graph out of the final network, stations and points.
pub fn build_graph(
    points: &[OdPoint],
    stations: &[Station],
    network: &[NetworkSegment],
    config: &MatrixConfig,
) -> MultimodalGraph {
    info!("Building augmented graph with transit + walking");

    let mut graph = MultimodalGraph::new();

    // Register every point and station up front so each one has a node even
    // when it ends up without edges
    for (idx, point) in points.iter().enumerate() {
        graph.add_node(NodeId::Point(idx), point.geometry);
    }
    for (idx, station) in stations.iter().enumerate() {
        graph.add_node(NodeId::Station(idx), station.geometry);
    }

    let transit = add_transit_edges(&mut graph, network, config.network_speed_kmh);
    debug!("Added {transit} transit edges");

    let boarding = connect_stations(&mut graph, stations, config.boarding_time_min);
    debug!("Connected {boarding} stations to the network");

    add_point_station_edges(
        &mut graph,
        points,
        stations,
        config.nearest_stations,
        config.walking_speed_kmh,
    );
    add_point_point_edges(
        &mut graph,
        points,
        config.nearest_points,
        config.walking_speed_kmh,
    );

    info!(
        "Graph has {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}

/// One edge per consecutive coordinate pair of every polyline.
pub(crate) fn add_transit_edges(
    graph: &mut MultimodalGraph,
    network: &[NetworkSegment],
    speed_kmh: f64,
) -> usize {
    let mut added = 0;
    for segment in network {
        for line in segment.geometry.lines() {
            let meters = Euclidean.length(&line);
            if !(meters > 0.0) {
                trace!("Skipping zero-length network piece at {:?}", line.start);
                continue;
            }
            let from = graph.add_network_vertex(line.start);
            let to = graph.add_network_vertex(line.end);
            graph.add_edge(from, to, travel_minutes(meters, speed_kmh), EdgeKind::Transit);
            added += 1;
        }
    }
    added
}

/// Links every station to its nearest network vertex with a fixed weight.
pub(crate) fn connect_stations(
    graph: &mut MultimodalGraph,
    stations: &[Station],
    boarding_time: f64,
) -> usize {
    if stations.is_empty() {
        return 0;
    }

    let vertices: Vec<_> = graph.network_vertices().collect();
    if vertices.is_empty() {
        warn!(
            "No network vertices to connect {} stations to, stations are walking-only",
            stations.len()
        );
        return 0;
    }

    info!("Connecting stations to nearest transit network node");
    let tree = point_tree(vertices.iter().map(|(_, coord)| *coord));

    let mut connected = 0;
    for (idx, station) in stations.iter().enumerate() {
        let Some(station_node) = graph.station_node(idx) else {
            continue;
        };
        if let Some(&(nearest, _)) = nearest_k(&tree, station.geometry.into(), 1).first() {
            graph.add_edge(
                station_node,
                vertices[nearest].0,
                boarding_time,
                EdgeKind::Boarding,
            );
            connected += 1;
        }
    }
    connected
}

/// Walking edges from every point to its `k` nearest stations.
pub(crate) fn add_point_station_edges(
    graph: &mut MultimodalGraph,
    points: &[OdPoint],
    stations: &[Station],
    k: usize,
    walking_speed_kmh: f64,
) {
    if stations.is_empty() || k == 0 {
        return;
    }

    info!("Adding walking edges from points to their {k} nearest stations");
    let tree = point_tree(stations.iter().map(|s| Coord::from(s.geometry)));

    for (idx, point) in points.iter().enumerate() {
        let Some(point_node) = graph.point_node(idx) else {
            continue;
        };
        for (station, meters) in nearest_k(&tree, point.geometry.into(), k) {
            if let Some(station_node) = graph.station_node(station) {
                graph.add_edge(
                    point_node,
                    station_node,
                    travel_minutes(meters, walking_speed_kmh),
                    EdgeKind::PointToStation,
                );
            }
        }
    }
}

/// Walking edges from every point to its `k` nearest other points.
pub(crate) fn add_point_point_edges(
    graph: &mut MultimodalGraph,
    points: &[OdPoint],
    k: usize,
    walking_speed_kmh: f64,
) {
    if points.len() < 2 || k == 0 {
        return;
    }

    info!("Adding walking edges to {k} nearest neighbors per point");
    let tree = point_tree(points.iter().map(|p| Coord::from(p.geometry)));

    for (idx, point) in points.iter().enumerate() {
        let Some(from) = graph.point_node(idx) else {
            continue;
        };
        for (neighbour, meters) in nearest_k_excluding(&tree, point.geometry.into(), k, idx) {
            if let Some(to) = graph.point_node(neighbour) {
                graph.add_edge(
                    from,
                    to,
                    travel_minutes(meters, walking_speed_kmh),
                    EdgeKind::PointToPoint,
                );
            }
        }
    }
}
