//! Multimodal travel-time matrix engine.
//!
//! Builds one weighted graph out of a polyline transit network, transfer
//! stations and origin/destination points, then runs a shortest-path search
//! from every point to produce an all-pairs travel-time matrix.

pub mod error;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;
pub mod spatial;

pub use error::Error;
pub use loading::{MatrixConfig, PipelineInput, RawLayer, create_multimodal_model};
pub use model::{Crs, MultimodalGraph, MultimodalModel, NodeId, OdPoint, PointId, Station};
pub use routing::{TravelTimeMatrix, travel_time_matrix};

/// Travel time in minutes
pub type Minutes = f64;

/// Edge weight of a station-to-network connector, in minutes.
/// Models boarding as an instantaneous hop.
pub const DEFAULT_BOARDING_TIME: Minutes = 0.0001;

/// Converts a metric length into minutes at the given speed.
///
/// `time_min = (meters / 1000) / speed_kmh * 60`
#[inline]
pub fn travel_minutes(meters: f64, speed_kmh: f64) -> Minutes {
    (meters / 1000.0) / speed_kmh * 60.0
}
