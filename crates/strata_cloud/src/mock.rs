//! Mock stack client for testing.
//!
//! Provides configurable mock implementations of the StackClient and
//! ArtifactStore traits for use in tests without touching a real control
//! plane.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::client::{ArtifactStore, StackClient, WaitTarget};
use crate::error::{CloudError, CloudResult};
use crate::types::{
    CreateStackRequest, Parameter, StackDescription, StackEvent, StackResource, UpdateStackRequest,
};

/// Captured call information for verification.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    pub method: String,
    pub stack_name: Option<String>,
    pub template_url: Option<String>,
    pub parameters: Option<Vec<Parameter>>,
    pub capabilities: Option<Vec<String>>,
}

impl CapturedCall {
    fn of(method: &str, stack_name: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            stack_name: Some(stack_name.into()),
            template_url: None,
            parameters: None,
            capabilities: None,
        }
    }
}

/// Mock stack client for testing.
///
/// The client captures all calls and serves scripted responses, allowing
/// tests to verify orchestration behavior without a remote service. Event
/// polling is scripted as a sequence of batches: each call to
/// `describe_stack_events` on the root stack advances the script, and the
/// last batch repeats once the script is exhausted. Nested stack histories
/// are keyed by stack id and served as-is.
#[derive(Clone)]
pub struct MockStackClient {
    /// Stacks that currently "exist" remotely.
    stacks: Arc<RwLock<Vec<StackDescription>>>,
    /// Scripted event batches for the root stack.
    event_batches: Arc<RwLock<Vec<Vec<StackEvent>>>>,
    /// Index of the next batch to serve.
    batch_index: Arc<AtomicUsize>,
    /// Event histories for nested stacks, keyed by stack id.
    nested_events: Arc<RwLock<HashMap<String, Vec<StackEvent>>>>,
    /// Resources served by describe_stack_resources, keyed by stack name.
    resources: Arc<RwLock<HashMap<String, Vec<StackResource>>>>,
    /// Captured calls for verification.
    captured_calls: Arc<RwLock<Vec<CapturedCall>>>,
    /// Failures to simulate, keyed by method name or "method:subject".
    fail_on: Arc<RwLock<HashMap<String, String>>>,
    /// Delay inserted into wait_for so a poller gets time to tick.
    wait_delay: Arc<RwLock<Duration>>,
    /// Terminal failure status reported by wait_for, if any.
    wait_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockStackClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStackClient {
    /// Create a new mock client with no stacks and no scripted events.
    pub fn new() -> Self {
        Self {
            stacks: Arc::new(RwLock::new(Vec::new())),
            event_batches: Arc::new(RwLock::new(Vec::new())),
            batch_index: Arc::new(AtomicUsize::new(0)),
            nested_events: Arc::new(RwLock::new(HashMap::new())),
            resources: Arc::new(RwLock::new(HashMap::new())),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            fail_on: Arc::new(RwLock::new(HashMap::new())),
            wait_delay: Arc::new(RwLock::new(Duration::ZERO)),
            wait_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Register a stack that already exists remotely.
    pub fn with_stack(self, description: StackDescription) -> Self {
        self.stacks.write().push(description);
        self
    }

    /// Script the event batches served for the root stack.
    pub fn with_event_batches(self, batches: Vec<Vec<StackEvent>>) -> Self {
        *self.event_batches.write() = batches;
        self
    }

    /// Append one event batch to the script.
    pub fn add_event_batch(self, batch: Vec<StackEvent>) -> Self {
        self.event_batches.write().push(batch);
        self
    }

    /// Register the event history of a nested stack.
    pub fn with_nested_events(self, stack_id: impl Into<String>, events: Vec<StackEvent>) -> Self {
        self.nested_events.write().insert(stack_id.into(), events);
        self
    }

    /// Register the resources reported for a stack.
    pub fn with_resources(
        self,
        stack_name: impl Into<String>,
        resources: Vec<StackResource>,
    ) -> Self {
        self.resources.write().insert(stack_name.into(), resources);
        self
    }

    /// Simulate a failure for a method, or for "method:subject" to target a
    /// single stack id.
    pub fn fail_on(self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.fail_on.write().insert(key.into(), message.into());
        self
    }

    /// Delay wait_for by the given duration before it resolves.
    pub fn with_wait_delay(self, delay: Duration) -> Self {
        *self.wait_delay.write() = delay;
        self
    }

    /// Make wait_for report the given terminal failure status.
    pub fn with_wait_failure(self, status: impl Into<String>) -> Self {
        *self.wait_failure.write() = Some(status.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured calls.
    pub fn get_calls(&self) -> Vec<CapturedCall> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Check if a specific method was called.
    pub fn was_called(&self, method: &str) -> bool {
        self.captured_calls
            .read()
            .iter()
            .any(|c| c.method == method)
    }

    /// Get calls to a specific method.
    pub fn get_method_calls(&self, method: &str) -> Vec<CapturedCall> {
        self.captured_calls
            .read()
            .iter()
            .filter(|c| c.method == method)
            .cloned()
            .collect()
    }

    /// Record a call.
    fn record_call(&self, call: CapturedCall) {
        self.captured_calls.write().push(call);
    }

    /// Check for a scripted failure on this method/subject pair.
    fn scripted_failure(&self, method: &str, subject: &str) -> CloudResult<()> {
        let fail_on = self.fail_on.read();
        if let Some(message) = fail_on
            .get(&format!("{}:{}", method, subject))
            .or_else(|| fail_on.get(method))
        {
            return Err(CloudError::Api(message.clone()));
        }
        Ok(())
    }

    /// Find a registered stack by name or id.
    fn find_stack(&self, key: &str) -> Option<StackDescription> {
        self.stacks
            .read()
            .iter()
            .find(|stack| stack.stack_name == key || stack.stack_id == key)
            .cloned()
    }

    fn next_root_batch(&self) -> Vec<StackEvent> {
        let batches = self.event_batches.read();
        if batches.is_empty() {
            return Vec::new();
        }
        let index = self.batch_index.fetch_add(1, Ordering::SeqCst);
        batches[index.min(batches.len() - 1)].clone()
    }
}

#[async_trait]
impl StackClient for MockStackClient {
    async fn create_stack(&self, request: &CreateStackRequest) -> CloudResult<String> {
        self.record_call(CapturedCall {
            method: "create_stack".to_string(),
            stack_name: Some(request.stack_name.clone()),
            template_url: Some(request.template_url.clone()),
            parameters: Some(request.parameters.clone()),
            capabilities: Some(request.capabilities.clone()),
        });
        self.scripted_failure("create_stack", &request.stack_name)?;

        if self.find_stack(&request.stack_name).is_some() {
            return Err(CloudError::AlreadyExists(request.stack_name.clone()));
        }

        let stack_id = format!(
            "arn:aws:cloudformation:us-east-1:123456789012:stack/{}/{}",
            request.stack_name,
            uuid::Uuid::new_v4()
        );
        self.stacks.write().push(
            StackDescription::new(stack_id.clone(), request.stack_name.clone())
                .status("CREATE_IN_PROGRESS"),
        );
        Ok(stack_id)
    }

    async fn update_stack(&self, request: &UpdateStackRequest) -> CloudResult<()> {
        self.record_call(CapturedCall {
            method: "update_stack".to_string(),
            stack_name: Some(request.stack_name.clone()),
            template_url: Some(request.template_url.clone()),
            parameters: Some(request.parameters.clone()),
            capabilities: Some(request.capabilities.clone()),
        });
        self.scripted_failure("update_stack", &request.stack_name)?;

        let mut stacks = self.stacks.write();
        match stacks
            .iter_mut()
            .find(|stack| stack.stack_name == request.stack_name)
        {
            Some(stack) => {
                stack.stack_status = "UPDATE_IN_PROGRESS".to_string();
                Ok(())
            }
            None => Err(CloudError::StackNotFound(request.stack_name.clone())),
        }
    }

    async fn delete_stack(&self, stack_name: &str) -> CloudResult<()> {
        self.record_call(CapturedCall::of("delete_stack", stack_name));
        self.scripted_failure("delete_stack", stack_name)?;
        self.stacks
            .write()
            .retain(|stack| stack.stack_name != stack_name && stack.stack_id != stack_name);
        Ok(())
    }

    async fn describe_stack_events(&self, stack_name: &str) -> CloudResult<Vec<StackEvent>> {
        self.record_call(CapturedCall::of("describe_stack_events", stack_name));
        self.scripted_failure("describe_stack_events", stack_name)?;

        if let Some(history) = self.nested_events.read().get(stack_name) {
            return Ok(history.clone());
        }
        Ok(self.next_root_batch())
    }

    async fn describe_stack_resources(&self, stack_name: &str) -> CloudResult<Vec<StackResource>> {
        self.record_call(CapturedCall::of("describe_stack_resources", stack_name));
        self.scripted_failure("describe_stack_resources", stack_name)?;
        Ok(self
            .resources
            .read()
            .get(stack_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_stacks(&self, stack_id_or_name: &str) -> CloudResult<StackDescription> {
        self.record_call(CapturedCall::of("describe_stacks", stack_id_or_name));
        self.scripted_failure("describe_stacks", stack_id_or_name)?;
        self.find_stack(stack_id_or_name)
            .ok_or_else(|| CloudError::StackNotFound(stack_id_or_name.to_string()))
    }

    async fn wait_for(&self, stack_name: &str, target: WaitTarget) -> CloudResult<()> {
        self.record_call(CapturedCall::of("wait_for", stack_name));

        let delay = *self.wait_delay.read();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.scripted_failure("wait_for", stack_name)?;
        if let Some(status) = self.wait_failure.read().clone() {
            return Err(CloudError::TerminalFailure {
                stack: stack_name.to_string(),
                status,
            });
        }

        let mut stacks = self.stacks.write();
        if let Some(stack) = stacks
            .iter_mut()
            .find(|stack| stack.stack_name == stack_name || stack.stack_id == stack_name)
        {
            stack.stack_status = target.status().to_string();
        }
        Ok(())
    }
}

/// Mock artifact store for testing.
#[derive(Clone)]
pub struct MockArtifactStore {
    /// Paths passed to upload, in call order.
    uploads: Arc<RwLock<Vec<PathBuf>>>,
    /// Base URL prefixed to uploaded file names.
    base_url: Arc<RwLock<String>>,
    /// Failure to simulate, if any.
    fail_with: Arc<RwLock<Option<String>>>,
}

impl Default for MockArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArtifactStore {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(RwLock::new(Vec::new())),
            base_url: Arc::new(RwLock::new(
                "https://artifacts.example.com/deployments".to_string(),
            )),
            fail_with: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the base URL returned for uploads.
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        *self.base_url.write() = base_url.into();
        self
    }

    /// Simulate an upload failure.
    pub fn fail_with(self, message: impl Into<String>) -> Self {
        *self.fail_with.write() = Some(message.into());
        self
    }

    /// Get all uploaded paths.
    pub fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.uploads.read().clone()
    }

    /// Get the number of uploads made.
    pub fn upload_count(&self) -> usize {
        self.uploads.read().len()
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    async fn upload(&self, local_path: &Path) -> CloudResult<String> {
        self.uploads.write().push(local_path.to_path_buf());

        if let Some(message) = self.fail_with.read().clone() {
            return Err(CloudError::Upload(message));
        }

        let file_name = local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| local_path.display().to_string());
        Ok(format!("{}/{}", self.base_url.read(), file_name))
    }
}
