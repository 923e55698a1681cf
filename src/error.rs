use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("Feature {feature} of '{}' has no '{field}' property", .path.display())]
    MissingIdField {
        path: PathBuf,
        field: String,
        feature: usize,
    },
    #[error("Unsupported GeoJSON in '{}': {reason}", .path.display())]
    Unsupported { path: PathBuf, reason: String },
    #[error(transparent)]
    Model(#[from] ttmatrix_core::Error),
}
