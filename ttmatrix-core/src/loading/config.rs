use serde::Deserialize;

use crate::{DEFAULT_BOARDING_TIME, Error, Minutes};

/// Parameters of a travel-time matrix run.
///
/// Passed explicitly into every pipeline stage.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
    /// Walking speed in km/h
    pub walking_speed_kmh: f64,
    /// Speed on the transit network in km/h
    pub network_speed_kmh: f64,
    /// Network endpoints closer than this (metres) are merged. `0` disables snapping.
    pub snap_tolerance_m: f64,
    /// Neighbourhood radius (metres) for synthesising stations from point density
    pub cluster_eps_m: f64,
    /// Stations closer than this (metres) to a polyline split it
    pub split_tolerance_m: f64,
    /// Weight in minutes of the edge between a station and its network vertex
    pub boarding_time_min: Minutes,
    /// Number of nearest stations each point walks to
    pub nearest_stations: usize,
    /// Number of nearest other points each point walks to
    pub nearest_points: usize,
    /// Only use the first N points (for testing)
    pub point_limit: Option<usize>,
    /// Size of the shortest-path worker pool. `None` uses all available cores.
    pub workers: Option<usize>,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            walking_speed_kmh: 5.0,
            network_speed_kmh: 33.0,
            snap_tolerance_m: 1.0,
            cluster_eps_m: 200.0,
            split_tolerance_m: 0.5,
            boarding_time_min: DEFAULT_BOARDING_TIME,
            nearest_stations: 3,
            nearest_points: 5,
            point_limit: None,
            workers: None,
        }
    }
}

impl MatrixConfig {
    /// Checks that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending parameter.
    pub fn validate(&self) -> Result<(), Error> {
        for (name, speed) in [
            ("walking_speed_kmh", self.walking_speed_kmh),
            ("network_speed_kmh", self.network_speed_kmh),
        ] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a positive number, got {speed}"
                )));
            }
        }

        for (name, value) in [
            ("snap_tolerance_m", self.snap_tolerance_m),
            ("cluster_eps_m", self.cluster_eps_m),
            ("split_tolerance_m", self.split_tolerance_m),
            ("boarding_time_min", self.boarding_time_min),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }

        if self.nearest_points == 0 {
            return Err(Error::InvalidConfig(
                "nearest_points must be at least 1".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.point_limit == Some(0) {
            return Err(Error::InvalidConfig(
                "point_limit must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
