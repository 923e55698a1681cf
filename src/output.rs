//! Writing the matrix, the enriched points and the edge export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo::LineString;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoJsonValue};
use log::info;
use serde::Serialize;
use serde_json::json;
use ttmatrix_core::TravelTimeMatrix;
use ttmatrix_core::model::{MultimodalGraph, MultimodalModel};
use wkt::ToWkt;

use crate::IoError;

/// Writes the matrix as CSV: a header of labels, one row per origin.
/// Unreachable pairs are left empty.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_matrix_csv(path: &Path, matrix: &TravelTimeMatrix) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path)?;
    let labels = matrix.labels();

    let header = std::iter::once(matrix.id_field.as_str()).chain(labels.iter().map(String::as_str));
    writer.write_record(header)?;
    for (label, row) in labels.iter().zip(&matrix.values) {
        let cells = row
            .iter()
            .map(|time| time.map(|t| t.to_string()).unwrap_or_default());
        writer.write_record(std::iter::once(label.clone()).chain(cells))?;
    }
    writer.flush()?;

    info!("Travel time matrix saved to {}", path.display());
    Ok(())
}

/// Writes the points in the working CRS with their original properties and
/// `mean_time_min` (null when no other point is reachable).
///
/// # Errors
///
/// Fails if the file cannot be written or `properties` does not match the
/// points.
pub fn write_points_geojson(
    path: &Path,
    model: &MultimodalModel,
    properties: &[JsonObject],
    mean_times: &[Option<f64>],
) -> Result<(), IoError> {
    if properties.len() != model.points.len() || mean_times.len() != model.points.len() {
        return Err(IoError::Unsupported {
            path: path.to_path_buf(),
            reason: format!(
                "{} points but {} property sets and {} mean times",
                model.points.len(),
                properties.len(),
                mean_times.len()
            ),
        });
    }

    let features = model
        .points
        .iter()
        .zip(properties)
        .zip(mean_times)
        .map(|((point, props), mean)| {
            let mut props = props.clone();
            props.insert("mean_time_min".to_string(), json!(mean));
            let value = json!({
                "type": "Feature",
                "geometry": Geometry::new(GeoJsonValue::from(&point.geometry)),
                "properties": props,
            });
            serde_json::from_value::<Feature>(value)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({"type": "name", "properties": {"name": model.crs.to_string()}}),
    );

    let collection = FeatureCollection {
        features,
        bbox: None,
        foreign_members: Some(members),
    };
    serde_json::to_writer(BufWriter::new(File::create(path)?), &collection)?;

    info!("Points with mean travel times saved to {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct EdgeRow {
    from_node: String,
    to_node: String,
    kind: &'static str,
    time_min: f64,
    geometry: String,
}

/// Writes every graph edge with its endpoints, weight, kind and WKT geometry.
///
/// # Errors
///
/// Fails if the file cannot be written.
pub fn write_edges_csv(path: &Path, graph: &MultimodalGraph) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut count = 0usize;
    for edge in graph.edge_records() {
        writer.serialize(EdgeRow {
            from_node: edge.from.to_string(),
            to_node: edge.to.to_string(),
            kind: edge.kind.as_str(),
            time_min: edge.time_min,
            geometry: LineString::from(edge.geometry).to_wkt().to_string(),
        })?;
        count += 1;
    }
    writer.flush()?;

    info!("{count} graph edges saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use ttmatrix_core::model::{Crs, EdgeKind, NodeId, PointId};

    use super::*;

    fn matrix() -> TravelTimeMatrix {
        TravelTimeMatrix {
            id_field: "cell_id".to_string(),
            ids: vec![PointId::Integer(1), PointId::Integer(2)],
            values: vec![vec![Some(0.0), Some(2.5)], vec![None, Some(0.0)]],
        }
    }

    #[test]
    fn matrix_csv_leaves_unreachable_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matrix.csv");
        write_matrix_csv(&path, &matrix()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["cell_id,cell_id1,cell_id2", "cell_id1,0,2.5", "cell_id2,,0"]
        );
    }

    #[test]
    fn points_geojson_carries_mean_and_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.geojson");
        let model = MultimodalModel {
            crs: Crs::from_epsg(32633).unwrap(),
            points: vec![
                ttmatrix_core::OdPoint::new(1, 10.0, 20.0),
                ttmatrix_core::OdPoint::new(2, 30.0, 40.0),
            ],
            stations: vec![],
            network: vec![],
            graph: MultimodalGraph::new(),
        };
        let mut props = JsonObject::new();
        props.insert("cell_id".to_string(), json!(1));
        let properties = vec![props.clone(), props];

        write_points_geojson(&path, &model, &properties, &[Some(2.5), None]).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["crs"]["properties"]["name"], "EPSG:32633");
        assert_eq!(written["features"][0]["properties"]["mean_time_min"], 2.5);
        assert!(written["features"][1]["properties"]["mean_time_min"].is_null());
        assert_eq!(
            written["features"][1]["geometry"]["coordinates"],
            json!([30.0, 40.0])
        );
    }

    #[test]
    fn edges_csv_has_wkt_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edges.csv");
        let mut graph = MultimodalGraph::new();
        let a = graph.add_node(NodeId::Point(0), geo::Point::new(0.0, 0.0));
        let b = graph.add_node(NodeId::Station(0), geo::Point::new(3.0, 4.0));
        graph.add_edge(a, b, 0.06, EdgeKind::PointToStation);

        write_edges_csv(&path, &graph).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["from_node", "to_node", "kind", "time_min", "geometry"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[0], "point_0");
        assert_eq!(&row[1], "station_0");
        assert_eq!(&row[2], "point_station");
        assert!(row[4].starts_with("LINESTRING"));
        assert!(row[4].contains("3 4"));
    }
}
