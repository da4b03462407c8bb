//! Stack client trait and waiter targets.

use std::path::Path;

use async_trait::async_trait;

use crate::error::CloudResult;
use crate::types::{
    CreateStackRequest, StackDescription, StackEvent, StackResource, UpdateStackRequest,
};

/// Terminal status a waiter watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    CreateComplete,
    UpdateComplete,
    DeleteComplete,
}

impl WaitTarget {
    /// The stack status string reported by the remote service on success.
    pub fn status(&self) -> &'static str {
        match self {
            WaitTarget::CreateComplete => "CREATE_COMPLETE",
            WaitTarget::UpdateComplete => "UPDATE_COMPLETE",
            WaitTarget::DeleteComplete => "DELETE_COMPLETE",
        }
    }
}

/// Remote stack control-plane client.
///
/// Implementations wrap the provider SDK and its retry policy; callers treat
/// every method as a single remote request with no retries of its own.
#[async_trait]
pub trait StackClient: Send + Sync {
    /// Request creation of a new stack. Returns the remote stack id.
    async fn create_stack(&self, request: &CreateStackRequest) -> CloudResult<String>;

    /// Request an update of an existing stack.
    async fn update_stack(&self, request: &UpdateStackRequest) -> CloudResult<()>;

    /// Request deletion of a stack.
    async fn delete_stack(&self, stack_name: &str) -> CloudResult<()>;

    /// Fetch the event history of a stack by name or id.
    async fn describe_stack_events(&self, stack_name: &str) -> CloudResult<Vec<StackEvent>>;

    /// List the provisioned resources of a stack.
    async fn describe_stack_resources(&self, stack_name: &str) -> CloudResult<Vec<StackResource>>;

    /// Describe a stack by name or id, including its declared outputs.
    async fn describe_stacks(&self, stack_id_or_name: &str) -> CloudResult<StackDescription>;

    /// Block until the stack reaches the target terminal status.
    async fn wait_for(&self, stack_name: &str, target: WaitTarget) -> CloudResult<()>;
}

/// Artifact upload collaborator.
///
/// Used by the update path to push the template to blob storage before the
/// update request references it by URL.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a local file and return its remote URL.
    async fn upload(&self, local_path: &Path) -> CloudResult<String>;
}
