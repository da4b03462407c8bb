//! Error types for the metadata module.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for metadata operations.
pub type MetaResult<T> = Result<T, MetaError>;

/// Errors that can occur during metadata operations.
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Project metadata not found at path: {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
