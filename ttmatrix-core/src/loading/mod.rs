//! This module turns raw input layers into a multimodal routing model:
//! CRS normalisation, endpoint snapping, station resolution, network
//! splitting and graph assembly.

mod builder;
mod config;
pub mod connectors;
pub mod normalize;
pub mod snapping;
pub mod splitting;
pub mod stations;

pub use builder::create_multimodal_model;
pub use config::MatrixConfig;
pub use connectors::build_graph;
pub use normalize::{NormalizedInput, PipelineInput, RawLayer, normalize};
pub use snapping::snap_endpoints;
pub use splitting::{split_at_stations, split_polyline};
pub use stations::{cluster_points, resolve_stations, synthesize_stations};
