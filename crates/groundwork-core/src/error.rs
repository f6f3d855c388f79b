//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown environment: {0} (expected one of: dev, prod)")]
    UnknownEnvironment(String),

    #[error("No TLS certificate registered for environment: {0}")]
    CertificateMissing(String),

    #[error("Invalid resource name: {0}")]
    InvalidResourceName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
