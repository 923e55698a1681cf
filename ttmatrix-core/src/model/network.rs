//! Transit network polylines

use geo::{
    Closest, ClosestPoint, Coord, Distance, Euclidean, Length, LineLocatePoint, LineString, Point,
};

/// One piece of the transit line. Direction carries no meaning.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSegment {
    pub geometry: LineString<f64>,
}

impl NetworkSegment {
    pub fn new(geometry: LineString<f64>) -> Self {
        Self { geometry }
    }

    pub fn from_coords(coords: &[(f64, f64)]) -> Self {
        Self {
            geometry: coords.iter().map(|&(x, y)| Coord { x, y }).collect(),
        }
    }

    /// Planar length in metres
    pub fn length(&self) -> f64 {
        Euclidean.length(&self.geometry)
    }

    /// Closest position on the polyline to `at`.
    ///
    /// Returns `None` for polylines with fewer than two coordinates.
    pub fn project(&self, at: Coord<f64>) -> Option<LineProjection> {
        if self.geometry.0.len() < 2 {
            return None;
        }
        let at = Point::from(at);
        let point = match self.geometry.closest_point(&at) {
            Closest::Intersection(point) | Closest::SinglePoint(point) => point,
            Closest::Indeterminate => return None,
        };
        let fraction = self.geometry.line_locate_point(&point)?;

        Some(LineProjection {
            point: point.0,
            distance_along: fraction * self.length(),
            offset: Euclidean.distance(point, at),
        })
    }

    /// First and last coordinate, if the polyline has at least two
    pub fn endpoints(&self) -> Option<(Coord<f64>, Coord<f64>)> {
        let coords = &self.geometry.0;
        if coords.len() < 2 {
            return None;
        }
        Some((coords[0], coords[coords.len() - 1]))
    }
}

/// Result of projecting a coordinate onto a polyline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineProjection {
    /// Closest position on the polyline
    pub point: Coord<f64>,
    /// Length of the polyline from its start to `point`
    pub distance_along: f64,
    /// Distance between the projected coordinate and `point`
    pub offset: f64,
}

pub(crate) fn coord_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    Euclidean.distance(Point::from(a), Point::from(b))
}
