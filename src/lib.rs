//! File layer of the travel-time matrix engine: GeoJSON input layers,
//! CSV/GeoJSON outputs.
//!
//! The computation itself lives in [`ttmatrix_core`].

pub mod error;
pub mod input;
pub mod output;

pub use error::IoError;
pub use input::{InputPaths, PointsLayer, load_input, read_layer, read_points};
pub use output::{write_edges_csv, write_matrix_csv, write_points_geojson};
pub use ttmatrix_core;
