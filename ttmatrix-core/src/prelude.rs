// Re-export key components
pub use crate::loading::{MatrixConfig, PipelineInput, RawLayer, create_multimodal_model};
pub use crate::model::{
    Crs, EdgeKind, EdgeRecord, MultimodalGraph, MultimodalModel, NetworkSegment, NodeId, OdPoint,
    PointId, Station,
};
pub use crate::routing::{TravelTimeMatrix, travel_time_matrix};

// Core types
pub use crate::Error;
pub use crate::Minutes;
