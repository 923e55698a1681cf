//! Cutting network polylines where a station sits on them, so each station
//! becomes a real network vertex.

use geo::{BoundingRect, Coord, Euclidean, Length, LineString};
use itertools::Itertools;
use log::{info, warn};
use rstar::AABB;

use crate::Error;
use crate::model::network::coord_distance;
use crate::model::{NetworkSegment, Station};
use crate::spatial::point_tree;

/// Splits every polyline at the projection of each station lying within
/// `tolerance` metres of it.
///
/// Zero-length pieces are dropped. A polyline that cannot be split is kept
/// whole and a warning is logged.
pub fn split_at_stations(
    segments: Vec<NetworkSegment>,
    stations: &[Station],
    tolerance: f64,
) -> Vec<NetworkSegment> {
    if stations.is_empty() {
        return segments;
    }

    info!("Splitting network lines at stations they pass through");

    let tree = point_tree(stations.iter().map(|s| Coord::from(s.geometry)));
    let mut result = Vec::with_capacity(segments.len() + stations.len());

    for segment in segments {
        let Some(envelope) = envelope(&segment, tolerance) else {
            result.push(segment);
            continue;
        };

        let cuts: Vec<f64> = tree
            .locate_in_envelope(&envelope)
            .filter_map(|candidate| {
                let at = Coord {
                    x: candidate.geom()[0],
                    y: candidate.geom()[1],
                };
                segment
                    .project(at)
                    .filter(|projection| projection.offset <= tolerance)
                    .map(|projection| projection.distance_along)
            })
            .collect();

        if cuts.is_empty() {
            result.push(segment);
            continue;
        }

        match split_polyline(&segment, cuts) {
            Ok(pieces) => result.extend(pieces),
            Err(e) => {
                warn!("Could not split line: {e}, keeping it unsplit");
                result.push(segment);
            }
        }
    }

    info!("Finished splitting, network now has {} segments", result.len());
    result
}

/// Cuts a polyline at the given distances along it.
///
/// # Errors
///
/// Returns [`Error::Split`] for polylines with fewer than two coordinates,
/// non-finite coordinates, or no length.
pub fn split_polyline(
    segment: &NetworkSegment,
    mut cuts: Vec<f64>,
) -> Result<Vec<NetworkSegment>, Error> {
    let coords = &segment.geometry.0;
    if coords.len() < 2 {
        return Err(Error::Split(format!(
            "polyline has {} coordinate(s)",
            coords.len()
        )));
    }
    if coords.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(Error::Split("polyline has non-finite coordinates".to_string()));
    }
    let total = segment.length();
    if total <= 0.0 {
        return Err(Error::Split("polyline has zero length".to_string()));
    }

    cuts.retain(|cut| cut.is_finite());
    cuts.sort_by(f64::total_cmp);
    cuts.dedup_by(|a, b| (*a - *b).abs() < 1e-9);

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut current = vec![coords[0]];
    let mut pending = cuts.into_iter().peekable();
    let mut walked = 0.0;

    for (&a, &b) in coords.iter().tuple_windows() {
        let length = coord_distance(a, b);
        let end = walked + length;

        while let Some(&cut) = pending.peek() {
            if cut > end {
                break;
            }
            pending.next();
            let t = if length > 0.0 {
                ((cut - walked) / length).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let at = a + (b - a) * t;
            push_distinct(&mut current, at);
            emit(&mut pieces, std::mem::replace(&mut current, vec![at]));
        }

        push_distinct(&mut current, b);
        walked = end;
    }
    emit(&mut pieces, current);

    Ok(pieces)
}

fn push_distinct(coords: &mut Vec<Coord<f64>>, coord: Coord<f64>) {
    if coords.last() != Some(&coord) {
        coords.push(coord);
    }
}

fn emit(pieces: &mut Vec<NetworkSegment>, coords: Vec<Coord<f64>>) {
    let line = LineString::from(coords);
    if line.0.len() >= 2 && Euclidean.length(&line) > 0.0 {
        pieces.push(NetworkSegment::new(line));
    }
}

fn envelope(segment: &NetworkSegment, tolerance: f64) -> Option<AABB<[f64; 2]>> {
    let rect = segment.geometry.bounding_rect()?;
    Some(AABB::from_corners(
        [rect.min().x - tolerance, rect.min().y - tolerance],
        [rect.max().x + tolerance, rect.max().y + tolerance],
    ))
}
