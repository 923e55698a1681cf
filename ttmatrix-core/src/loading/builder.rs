use geo::{ConvexHull, Intersects, MultiPoint};
use log::{info, warn};

use super::config::MatrixConfig;
use super::connectors::build_graph;
use super::normalize::{PipelineInput, normalize};
use super::snapping::snap_endpoints;
use super::splitting::split_at_stations;
use super::stations::resolve_stations;
use crate::Error;
use crate::model::{MultimodalModel, NetworkSegment, OdPoint};

/// Runs the loading pipeline and builds the multimodal graph
///
/// Layers are normalised into one metric CRS, network endpoints are snapped,
/// stations are resolved against the snapped network, polylines are split at
/// stations and the graph is assembled from the result.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or if the inputs cannot
/// be normalised
pub fn create_multimodal_model(
    input: PipelineInput,
    config: &MatrixConfig,
) -> Result<MultimodalModel, Error> {
    config.validate()?;

    info!(
        "Normalizing {} points and {} network geometries",
        input.points.geometries.len(),
        input.network.geometries.len()
    );
    let normalized = normalize(input, config)?;
    let crs = normalized.crs;
    let points = normalized.points;
    let mut network = normalized.network;

    let moved = snap_endpoints(&mut network, config.snap_tolerance_m);
    info!("Snapping moved {moved} network coordinates");

    let stations = resolve_stations(
        normalized.stations,
        &points,
        &network,
        config.cluster_eps_m,
    );
    if stations.is_empty() {
        warn!("No stations available, travel times will be walking-only");
    }

    let network = split_at_stations(network, &stations, config.split_tolerance_m);
    check_coverage(&network, &points);

    let graph = build_graph(&points, &stations, &network, config);

    let model = MultimodalModel {
        crs,
        points,
        stations,
        network,
        graph,
    };
    info!("Multimodal model created: {}", model.summary());
    Ok(model)
}

#[allow(clippy::cast_precision_loss)]
fn check_coverage(network: &[NetworkSegment], points: &[OdPoint]) {
    let vertices: MultiPoint = network
        .iter()
        .flat_map(|segment| segment.geometry.points())
        .collect();
    if vertices.0.len() < 3 || points.is_empty() {
        return;
    }
    let hull = vertices.convex_hull();

    let outside = points
        .iter()
        .filter(|point| !point.geometry.intersects(&hull))
        .count();

    if outside > 0 {
        let percentage = (outside as f64 / points.len() as f64) * 100.0;
        warn!(
            "{outside} of {} points ({percentage:.1}%) are outside the network coverage area. \
            They can only be reached on foot.",
            points.len()
        );
    }
}
