//! Data model for multimodal travel-time computation
//!
//! Contains the geometric inputs (points, stations, network polylines),
//! coordinate reference systems, and the combined routing graph.

pub mod crs;
pub mod graph;
pub mod multimodal_model;
pub mod network;
pub mod points;

pub use crs::{Crs, Reprojection, UtmProjection};
pub use graph::{EdgeKind, EdgeRecord, GraphEdge, GraphNode, MultimodalGraph, NodeId, VertexKey};
pub use multimodal_model::MultimodalModel;
pub use network::{LineProjection, NetworkSegment};
pub use points::{OdPoint, PointId, Station};
