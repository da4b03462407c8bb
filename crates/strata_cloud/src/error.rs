//! Error types for the cloud client module.

use thiserror::Error;

/// Result type alias for cloud client operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can occur while talking to the remote control plane.
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Stack not found: {0}")]
    StackNotFound(String),

    #[error("Stack already exists: {0}")]
    AlreadyExists(String),

    #[error("Stack {stack} reached terminal status {status}")]
    TerminalFailure { stack: String, status: String },

    #[error("Remote API error: {0}")]
    Api(String),

    #[error("Artifact upload failed: {0}")]
    Upload(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
