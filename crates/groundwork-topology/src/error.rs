//! Topology assembly errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Resource already declared with a different spec: {0}")]
    ConflictingResource(String),

    #[error("Unknown resource referenced: {0}")]
    UnknownResource(String),

    #[error("Access matrix violation: {0}")]
    MatrixViolation(String),

    #[error(transparent)]
    Core(#[from] groundwork_core::CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopologyError>;
