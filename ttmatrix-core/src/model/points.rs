//! Origin/destination points and transfer stations

use std::fmt;

use geo::Point;

/// Caller-supplied identifier of an origin/destination point
#[derive(Debug, Clone, PartialEq)]
pub enum PointId {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointId::Integer(value) => write!(f, "{value}"),
            // Whole floats keep their decimal point so `1.0` and `1` stay distinct labels
            PointId::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{value:.1}")
            }
            PointId::Float(value) => write!(f, "{value}"),
            PointId::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for PointId {
    fn from(value: i64) -> Self {
        PointId::Integer(value)
    }
}

impl From<&str> for PointId {
    fn from(value: &str) -> Self {
        PointId::Text(value.to_string())
    }
}

/// Origin/destination point in the working (planar) CRS
#[derive(Debug, Clone, PartialEq)]
pub struct OdPoint {
    pub id: PointId,
    pub geometry: Point<f64>,
}

impl OdPoint {
    pub fn new(id: impl Into<PointId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            geometry: Point::new(x, y),
        }
    }
}

/// Transfer point between the walking layer and the transit network.
/// Identified only by its position in the station list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub geometry: Point<f64>,
}

impl Station {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            geometry: Point::new(x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PointId;

    #[test]
    fn identifiers_render_like_their_source_values() {
        assert_eq!(PointId::Integer(17).to_string(), "17");
        assert_eq!(PointId::Float(3.0).to_string(), "3.0");
        assert_eq!(PointId::Float(2.5).to_string(), "2.5");
        assert_eq!(PointId::from("A-12").to_string(), "A-12");
    }
}
