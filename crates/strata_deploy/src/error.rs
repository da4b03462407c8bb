//! Error types for the deployment module.

use std::fmt;

use thiserror::Error;

use strata_cloud::CloudError;
use strata_meta::MetaError;

/// Result type alias for deployment operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Phase of a stack operation in which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationPhase {
    Create,
    Update,
    Delete,
    Describe,
    Upload,
    Outputs,
}

impl fmt::Display for OperationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationPhase::Create => "create",
            OperationPhase::Update => "update",
            OperationPhase::Delete => "delete",
            OperationPhase::Describe => "describe",
            OperationPhase::Upload => "upload",
            OperationPhase::Outputs => "outputs",
        };
        write!(f, "{}", name)
    }
}

/// Errors that can occur while executing a stack operation.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Stack already exists: {0}")]
    AlreadyExists(String),

    #[error("Remote {phase} request failed: {source}")]
    RemoteRequestFailed {
        phase: OperationPhase,
        #[source]
        source: CloudError,
    },

    #[error("Stack {phase} did not complete: {reason}")]
    WaitFailed {
        phase: OperationPhase,
        reason: String,
    },

    #[error("Metadata error: {0}")]
    Meta(#[from] MetaError),
}
