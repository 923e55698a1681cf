//! Reading input layers from GeoJSON files

use std::fs;
use std::path::Path;

use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use log::{debug, info, warn};
use ttmatrix_core::model::{Crs, PointId};
use ttmatrix_core::{PipelineInput, RawLayer};

use crate::IoError;

/// Points layer with identifiers and the original feature properties
#[derive(Debug, Clone)]
pub struct PointsLayer {
    pub layer: RawLayer,
    pub ids: Vec<PointId>,
    /// Properties of every feature, same order as `ids`
    pub properties: Vec<JsonObject>,
}

/// Reads every feature geometry of a GeoJSON file.
///
/// The CRS is taken from the legacy top-level `crs` member, falling back to
/// `crs_override`. Features without geometry are skipped.
///
/// # Errors
///
/// Fails if the file is missing or is not valid GeoJSON.
pub fn read_layer(path: &Path, crs_override: Option<Crs>) -> Result<RawLayer, IoError> {
    let (crs, features) = read_features(path, crs_override)?;
    let geometries = features
        .into_iter()
        .filter_map(|feature| feature.geometry)
        .map(geo::Geometry::<f64>::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    debug!("Read {} geometries from {}", geometries.len(), path.display());
    Ok(RawLayer::new(layer_name(path), crs, geometries))
}

/// Reads a points layer together with the `id_field` property of every
/// feature.
///
/// # Errors
///
/// Fails like [`read_layer`], and with [`IoError::MissingIdField`] when a
/// feature lacks a usable identifier.
pub fn read_points(
    path: &Path,
    id_field: &str,
    crs_override: Option<Crs>,
) -> Result<PointsLayer, IoError> {
    let (crs, features) = read_features(path, crs_override)?;

    let mut geometries = Vec::with_capacity(features.len());
    let mut ids = Vec::with_capacity(features.len());
    let mut properties = Vec::with_capacity(features.len());

    for (idx, feature) in features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!("Skipping point feature {idx} without geometry");
            continue;
        };
        let props = feature.properties.unwrap_or_default();
        let id = props
            .get(id_field)
            .and_then(point_id)
            .ok_or_else(|| IoError::MissingIdField {
                path: path.to_path_buf(),
                field: id_field.to_string(),
                feature: idx,
            })?;

        geometries.push(geo::Geometry::<f64>::try_from(geometry)?);
        ids.push(id);
        properties.push(props);
    }

    info!("Read {} points from {}", ids.len(), path.display());
    Ok(PointsLayer {
        layer: RawLayer::new(layer_name(path), crs, geometries),
        ids,
        properties,
    })
}

/// Paths and CRS overrides of one run
#[derive(Debug, Clone)]
pub struct InputPaths<'a> {
    pub points: &'a Path,
    pub network: &'a Path,
    pub stations: Option<&'a Path>,
    pub id_field: &'a str,
    pub points_crs: Option<Crs>,
    pub network_crs: Option<Crs>,
    pub stations_crs: Option<Crs>,
}

/// Loads all layers of a run. A stations path that does not exist means
/// stations are synthesised.
///
/// # Errors
///
/// Fails if a points or network file cannot be read.
pub fn load_input(paths: &InputPaths<'_>) -> Result<(PipelineInput, Vec<JsonObject>), IoError> {
    let points = read_points(paths.points, paths.id_field, paths.points_crs)?;
    let network = read_layer(paths.network, paths.network_crs)?;

    let stations = match paths.stations {
        Some(path) if path.exists() => Some(read_layer(path, paths.stations_crs)?),
        Some(path) => {
            info!("Stations file {} not found, stations will be generated", path.display());
            None
        }
        None => None,
    };

    let input = PipelineInput {
        points: points.layer,
        point_ids: points.ids,
        network,
        stations,
    };
    Ok((input, points.properties))
}

fn read_features(
    path: &Path,
    crs_override: Option<Crs>,
) -> Result<(Option<Crs>, Vec<Feature>), IoError> {
    if !path.exists() {
        return Err(IoError::MissingFile(path.to_path_buf()));
    }
    let text = fs::read_to_string(path)?;
    let geojson: GeoJson = text.parse()?;

    let (declared, features) = match geojson {
        GeoJson::FeatureCollection(collection) => (
            collection.foreign_members.as_ref().and_then(declared_crs),
            collection.features,
        ),
        GeoJson::Feature(feature) => (
            feature.foreign_members.as_ref().and_then(declared_crs),
            vec![feature],
        ),
        GeoJson::Geometry(_) => {
            return Err(IoError::Unsupported {
                path: path.to_path_buf(),
                reason: "expected a FeatureCollection or Feature".to_string(),
            });
        }
    };

    let crs = match (declared, crs_override) {
        (Some(declared), Some(over)) if declared != over => {
            warn!(
                "{} declares {declared}, using configured {over} instead",
                path.display()
            );
            Some(over)
        }
        (declared, over) => over.or(declared),
    };
    Ok((crs, features))
}

/// CRS from a `{"crs": {"type": "name", "properties": {"name": ...}}}` member
fn declared_crs(members: &JsonObject) -> Option<Crs> {
    let name = members
        .get("crs")?
        .get("properties")?
        .get("name")?
        .as_str()?;
    match name.parse() {
        Ok(crs) => Some(crs),
        Err(e) => {
            warn!("Ignoring crs member: {e}");
            None
        }
    }
}

fn point_id(value: &JsonValue) -> Option<PointId> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .map(PointId::Integer)
            .or_else(|| n.as_f64().map(PointId::Float)),
        JsonValue::String(s) => Some(PointId::Text(s.clone())),
        _ => None,
    }
}

fn layer_name(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}
