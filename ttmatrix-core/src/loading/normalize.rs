//! Bringing every input layer into one planar, metric CRS

use geo::{Centroid, Geometry, LineString, MapCoordsInPlace, MultiPoint, Point};
use log::{debug, info};

use crate::model::{Crs, NetworkSegment, OdPoint, PointId, Reprojection, Station};
use crate::{Error, MatrixConfig};

/// Geometries of one input layer together with the CRS they are expressed in
#[derive(Debug, Clone)]
pub struct RawLayer {
    /// Layer name used in error messages
    pub name: String,
    pub crs: Option<Crs>,
    pub geometries: Vec<Geometry<f64>>,
}

impl RawLayer {
    pub fn new(name: impl Into<String>, crs: Option<Crs>, geometries: Vec<Geometry<f64>>) -> Self {
        Self {
            name: name.into(),
            crs,
            geometries,
        }
    }
}

/// Everything the pipeline consumes, as loaded from disk
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub points: RawLayer,
    /// Identifier of every point geometry, same order
    pub point_ids: Vec<PointId>,
    pub network: RawLayer,
    /// `None` when stations have to be synthesised
    pub stations: Option<RawLayer>,
}

/// Inputs expressed in the working CRS
#[derive(Debug, Clone)]
pub struct NormalizedInput {
    pub crs: Crs,
    pub points: Vec<OdPoint>,
    pub network: Vec<NetworkSegment>,
    pub stations: Option<Vec<Station>>,
}

/// Projects all layers into the working CRS.
///
/// Geographic points select the UTM zone of their centroid, projected points
/// keep their own CRS and everything else follows it. Areal point geometries
/// are reduced to centroids.
///
/// # Errors
///
/// Fails when a layer has no CRS, when a layer cannot be moved into the
/// working CRS, or when geometries are of an unusable type.
pub fn normalize(input: PipelineInput, config: &MatrixConfig) -> Result<NormalizedInput, Error> {
    let PipelineInput {
        mut points,
        mut point_ids,
        network,
        stations,
    } = input;

    if points.geometries.len() != point_ids.len() {
        return Err(Error::InvalidGeometry(format!(
            "{} point geometries but {} identifiers",
            points.geometries.len(),
            point_ids.len()
        )));
    }

    if let Some(limit) = config.point_limit {
        if points.geometries.len() > limit {
            info!("Limiting points to the first {limit} for testing");
            points.geometries.truncate(limit);
            point_ids.truncate(limit);
        }
    }

    if points.geometries.is_empty() {
        return Err(Error::EmptyInput(format!("layer '{}' has no points", points.name)));
    }

    let points_crs = require_crs(&points)?;
    let point_locations = to_points(&points)?;

    let working_crs = if points_crs.is_projected() {
        points_crs
    } else {
        let centroid = MultiPoint::from(point_locations.clone())
            .centroid()
            .ok_or_else(|| Error::InvalidGeometry("points have no centroid".to_string()))?;
        let crs = Crs::utm_for(centroid.x(), centroid.y());
        info!("Points are in geographic coordinates, reprojecting to {crs}");
        crs
    };

    let reprojection = Reprojection::between(&points.name, points_crs, working_crs)?;
    let points = point_ids
        .into_iter()
        .zip(point_locations)
        .map(|(id, location)| OdPoint {
            id,
            geometry: reprojection.apply(location.into()).into(),
        })
        .collect::<Vec<_>>();

    let network_crs = require_crs(&network)?;
    let reprojection = Reprojection::between(&network.name, network_crs, working_crs)?;
    let network = to_segments(&network)?
        .into_iter()
        .map(|mut line| {
            line.map_coords_in_place(|c| reprojection.apply(c));
            NetworkSegment::new(line)
        })
        .collect::<Vec<_>>();

    let stations = stations
        .map(|layer| -> Result<Vec<Station>, Error> {
            let crs = require_crs(&layer)?;
            let reprojection = Reprojection::between(&layer.name, crs, working_crs)?;
            Ok(to_points(&layer)?
                .into_iter()
                .map(|p| Station {
                    geometry: reprojection.apply(p.into()).into(),
                })
                .collect())
        })
        .transpose()?;

    debug!(
        "Normalized {} points, {} network segments, {} stations into {working_crs}",
        points.len(),
        network.len(),
        stations.as_ref().map_or(0, Vec::len)
    );

    Ok(NormalizedInput {
        crs: working_crs,
        points,
        network,
        stations,
    })
}

fn require_crs(layer: &RawLayer) -> Result<Crs, Error> {
    layer.crs.ok_or_else(|| Error::MissingCrs(layer.name.clone()))
}

/// Points stay points, anything with an area (or extent) becomes its centroid
fn to_points(layer: &RawLayer) -> Result<Vec<Point<f64>>, Error> {
    layer
        .geometries
        .iter()
        .enumerate()
        .map(|(idx, geometry)| match geometry {
            Geometry::Point(point) => Ok(*point),
            other => other.centroid().ok_or_else(|| {
                Error::InvalidGeometry(format!(
                    "feature {idx} of layer '{}' has no centroid",
                    layer.name
                ))
            }),
        })
        .collect()
}

fn to_segments(layer: &RawLayer) -> Result<Vec<LineString<f64>>, Error> {
    let mut lines = Vec::with_capacity(layer.geometries.len());
    for (idx, geometry) in layer.geometries.iter().enumerate() {
        match geometry {
            Geometry::LineString(line) => lines.push(line.clone()),
            Geometry::MultiLineString(multi) => lines.extend(multi.0.iter().cloned()),
            Geometry::Line(line) => lines.push(LineString::new(vec![line.start, line.end])),
            _ => {
                return Err(Error::InvalidGeometry(format!(
                    "feature {idx} of layer '{}' is not a line",
                    layer.name
                )));
            }
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Polygon, polygon};

    use super::*;

    fn projected_input() -> PipelineInput {
        let crs = Some(Crs::Utm {
            zone: 33,
            north: true,
        });
        PipelineInput {
            points: RawLayer::new(
                "points",
                crs,
                vec![
                    Geometry::Point(Point::new(0.0, 0.0)),
                    Geometry::Polygon(polygon![
                        (x: 10.0, y: 10.0),
                        (x: 20.0, y: 10.0),
                        (x: 20.0, y: 20.0),
                        (x: 10.0, y: 20.0),
                    ]),
                ],
            ),
            point_ids: vec![PointId::Integer(1), PointId::Integer(2)],
            network: RawLayer::new(
                "network",
                crs,
                vec![Geometry::LineString(LineString::from(vec![
                    (0.0, 0.0),
                    (100.0, 0.0),
                ]))],
            ),
            stations: None,
        }
    }

    #[test]
    fn projected_inputs_are_kept_and_polygons_become_centroids() {
        let normalized = normalize(projected_input(), &MatrixConfig::default()).unwrap();
        assert_eq!(
            normalized.crs,
            Crs::Utm {
                zone: 33,
                north: true
            }
        );
        assert_eq!(normalized.points[1].geometry, Point::new(15.0, 15.0));
        assert_eq!(normalized.network.len(), 1);
        assert!(normalized.stations.is_none());
    }

    #[test]
    fn missing_crs_is_fatal() {
        let mut input = projected_input();
        input.network.crs = None;
        let err = normalize(input, &MatrixConfig::default()).unwrap_err();
        assert!(matches!(err, Error::MissingCrs(name) if name == "network"));
    }

    #[test]
    fn geographic_points_select_utm_zone_from_centroid() {
        let input = PipelineInput {
            points: RawLayer::new(
                "points",
                Some(Crs::WGS84),
                vec![
                    Geometry::Point(Point::new(13.3, 52.5)),
                    Geometry::Point(Point::new(13.5, 52.5)),
                ],
            ),
            point_ids: vec![PointId::from("a"), PointId::from("b")],
            network: RawLayer::new(
                "network",
                Some(Crs::WGS84),
                vec![Geometry::LineString(LineString::from(vec![
                    (13.3, 52.5),
                    (13.5, 52.5),
                ]))],
            ),
            stations: Some(RawLayer::new(
                "stations",
                Some(Crs::WGS84),
                vec![Geometry::Point(Point::new(13.4, 52.5))],
            )),
        };
        let normalized = normalize(input, &MatrixConfig::default()).unwrap();
        assert_eq!(
            normalized.crs,
            Crs::Utm {
                zone: 33,
                north: true
            }
        );
        // 0.2 degrees of longitude at 52.5N is roughly 13.5 km
        let a = normalized.points[0].geometry;
        let b = normalized.points[1].geometry;
        let distance = (b.x() - a.x()).hypot(b.y() - a.y());
        assert!((distance - 13_540.0).abs() < 100.0, "got {distance}");
        let line = &normalized.network[0].geometry.0;
        assert!((line[0].x - a.x()).abs() < 1e-6);
        assert_eq!(normalized.stations.unwrap().len(), 1);
    }

    #[test]
    fn mismatched_projected_crs_is_rejected() {
        let mut input = projected_input();
        input.network.crs = Some(Crs::Projected(3857));
        let err = normalize(input, &MatrixConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedReprojection { .. }));
    }

    #[test]
    fn point_limit_truncates_before_processing() {
        let config = MatrixConfig {
            point_limit: Some(1),
            ..MatrixConfig::default()
        };
        let normalized = normalize(projected_input(), &config).unwrap();
        assert_eq!(normalized.points.len(), 1);
        assert_eq!(normalized.points[0].id, PointId::Integer(1));
    }

    #[test]
    fn non_line_network_feature_is_rejected() {
        let mut input = projected_input();
        input.network.geometries.push(Geometry::Polygon(Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]),
            vec![],
        )));
        assert!(matches!(
            normalize(input, &MatrixConfig::default()),
            Err(Error::InvalidGeometry(_))
        ));
    }
}
