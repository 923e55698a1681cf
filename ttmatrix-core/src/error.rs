use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Layer '{0}' has no coordinate reference system")]
    MissingCrs(String),
    #[error("Cannot reproject layer '{layer}' from {from} to {to}")]
    UnsupportedReprojection {
        layer: String,
        from: String,
        to: String,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Empty input: {0}")]
    EmptyInput(String),
    #[error("Failed to split segment: {0}")]
    Split(String),
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
