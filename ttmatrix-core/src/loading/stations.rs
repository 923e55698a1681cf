//! Station resolution: supplied stations are used as-is, otherwise stations
//! are synthesised from point density and placed on the network.

use geo::Coord;
use log::{info, warn};

use crate::model::{NetworkSegment, OdPoint, Station};
use crate::spatial::{nearest_segment, point_tree, segment_tree, within_radius};

/// Returns the supplied stations, or synthesises them when there are none.
pub fn resolve_stations(
    supplied: Option<Vec<Station>>,
    points: &[OdPoint],
    network: &[NetworkSegment],
    cluster_eps: f64,
) -> Vec<Station> {
    match supplied {
        Some(stations) => {
            info!("Using {} supplied stations", stations.len());
            stations
        }
        None => synthesize_stations(points, network, cluster_eps),
    }
}

/// One station per density cluster of points, projected onto the nearest
/// network polyline.
pub fn synthesize_stations(
    points: &[OdPoint],
    network: &[NetworkSegment],
    cluster_eps: f64,
) -> Vec<Station> {
    info!("No stations supplied, generating artificial stations (eps = {cluster_eps} m)");

    if network.iter().all(|segment| segment.endpoints().is_none()) {
        warn!("Network has no usable segments, no stations generated");
        return Vec::new();
    }

    let coords: Vec<Coord<f64>> = points.iter().map(|p| p.geometry.into()).collect();
    let clusters = cluster_points(&coords, cluster_eps);
    let tree = segment_tree(network);

    let stations: Vec<Station> = clusters
        .iter()
        .filter_map(|members| {
            let centroid = mean(members.iter().map(|&idx| coords[idx]));
            let segment = nearest_segment(&tree, centroid)?;
            let projection = network[segment].project(centroid)?;
            Some(Station {
                geometry: projection.point.into(),
            })
        })
        .collect();

    info!("Generated {} artificial stations", stations.len());
    stations
}

/// Density clustering with a minimum cluster size of one.
///
/// Every point is a core point, so clusters are the connected components of
/// the "within `eps`" relation. Clusters are numbered in order of their
/// lowest member; members are listed in index order.
pub fn cluster_points(coords: &[Coord<f64>], eps: f64) -> Vec<Vec<usize>> {
    let tree = point_tree(coords.iter().copied());
    let mut label: Vec<Option<usize>> = vec![None; coords.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for seed in 0..coords.len() {
        if label[seed].is_some() {
            continue;
        }
        let cluster_id = clusters.len();
        label[seed] = Some(cluster_id);
        let mut members = vec![seed];
        let mut frontier = vec![seed];

        while let Some(current) = frontier.pop() {
            for neighbour in within_radius(&tree, coords[current], eps) {
                if label[neighbour].is_none() {
                    label[neighbour] = Some(cluster_id);
                    members.push(neighbour);
                    frontier.push(neighbour);
                }
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

    clusters
}

#[allow(clippy::cast_precision_loss)]
fn mean(coords: impl Iterator<Item = Coord<f64>>) -> Coord<f64> {
    let (sum, count) = coords.fold((Coord { x: 0.0, y: 0.0 }, 0usize), |(sum, n), c| {
        (sum + c, n + 1)
    });
    sum / count as f64
}
