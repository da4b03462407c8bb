//! Stack operation controller.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use strata_cloud::{
    ArtifactStore, CloudError, CreateStackRequest, StackClient, UpdateStackRequest, WaitTarget,
};
use strata_meta::MetaStore;

use crate::config::DeployConfig;
use crate::error::{DeployError, DeployResult, OperationPhase};
use crate::monitor::{EventMonitor, MonitorHandle};
use crate::operation::{OperationKind, StackOperation};
use crate::outputs::{OutputMap, OutputPropagator};
use crate::render::{ConsoleSink, ProgressSink};

/// Drives create, update and delete operations against the remote control
/// plane.
///
/// Each polled operation runs one event monitor for its duration: the
/// deployer spawns the monitor after the mutating request is accepted,
/// awaits the terminal status, and stops the monitor exactly once on every
/// path before returning. Output propagation runs only after a successful
/// create or update.
pub struct StackDeployer {
    client: Arc<dyn StackClient>,
    artifacts: Arc<dyn ArtifactStore>,
    sink: Arc<dyn ProgressSink>,
    config: DeployConfig,
}

impl StackDeployer {
    /// Create a deployer that renders progress to stdout.
    pub fn new(client: Arc<dyn StackClient>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self {
            client,
            artifacts,
            sink: Arc::new(ConsoleSink::new()),
            config: DeployConfig::default(),
        }
    }

    /// Set a custom progress sink.
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set a custom configuration.
    pub fn with_config(mut self, config: DeployConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute one stack operation to completion.
    ///
    /// Returns the propagated outputs on success; delete operations return
    /// an empty map.
    pub async fn execute(
        &self,
        operation: StackOperation,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        match operation.kind {
            OperationKind::Create => self.create(&operation, store).await,
            OperationKind::Update => self.update(&operation, store).await,
            OperationKind::Delete => self.delete(&operation, store).await,
        }
    }

    async fn create(
        &self,
        operation: &StackOperation,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        info!("Creating stack {}", operation.stack_name);

        // The stack must not exist yet; only a clean not-found lets the
        // create proceed.
        match self.client.describe_stacks(&operation.stack_name).await {
            Ok(_) => return Err(DeployError::AlreadyExists(operation.stack_name.clone())),
            Err(CloudError::StackNotFound(_)) => {}
            Err(source) => {
                return Err(DeployError::RemoteRequestFailed {
                    phase: OperationPhase::Describe,
                    source,
                })
            }
        }

        // Events from before this instant belong to earlier operations.
        let start_time = Utc::now();

        let mut request =
            CreateStackRequest::new(&operation.stack_name, &operation.template_location)
                .capabilities(self.config.capabilities.clone());
        for (key, value) in &operation.remote_parameters {
            request = request.parameter(key, value);
        }

        let stack_id = self.client.create_stack(&request).await.map_err(|source| {
            DeployError::RemoteRequestFailed {
                phase: OperationPhase::Create,
                source,
            }
        })?;
        debug!("Create accepted for {} as {}", operation.stack_name, stack_id);

        let monitor = self.spawn_monitor(&operation.stack_name, start_time);
        let outcome = self
            .await_completion(
                &operation.stack_name,
                WaitTarget::CreateComplete,
                OperationPhase::Create,
            )
            .await;
        monitor.stop().await;
        outcome?;

        info!("Stack {} created", operation.stack_name);
        self.propagate_outputs(&operation.stack_name, store).await
    }

    async fn update(
        &self,
        operation: &StackOperation,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        let (recorded_stack, recorded_bucket) = store.stack_identifiers();
        if recorded_stack.is_none() {
            return Err(DeployError::PreconditionFailed(
                "project stack is not recorded in metadata; initialize the project first"
                    .to_string(),
            ));
        }
        let Some(deployment_bucket) = recorded_bucket.map(str::to_string) else {
            return Err(DeployError::PreconditionFailed(
                "project deployment bucket is not recorded in metadata; initialize the project first"
                    .to_string(),
            ));
        };

        info!("Updating stack {}", operation.stack_name);

        let template_url = self
            .artifacts
            .upload(Path::new(&operation.template_location))
            .await
            .map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Upload,
                source,
            })?;
        debug!("Template uploaded to {}", template_url);

        let start_time = Utc::now();

        // An update against a stack that was deleted out-of-band fails
        // here, before the mutating request.
        self.client
            .describe_stacks(&operation.stack_name)
            .await
            .map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Describe,
                source,
            })?;

        let mut request = UpdateStackRequest::new(&operation.stack_name, &template_url)
            .capabilities(self.config.capabilities.clone());
        // The recorded bucket owns the DeploymentBucketName parameter; a
        // caller-supplied value for that key is discarded.
        for (key, value) in &operation.remote_parameters {
            if key != "DeploymentBucketName" {
                request = request.parameter(key, value);
            }
        }
        request = request.parameter("DeploymentBucketName", &deployment_bucket);

        self.client.update_stack(&request).await.map_err(|source| {
            DeployError::RemoteRequestFailed {
                phase: OperationPhase::Update,
                source,
            }
        })?;

        let monitor = self.spawn_monitor(&operation.stack_name, start_time);
        let outcome = self
            .await_completion(
                &operation.stack_name,
                WaitTarget::UpdateComplete,
                OperationPhase::Update,
            )
            .await;
        monitor.stop().await;
        outcome?;

        info!("Stack {} updated", operation.stack_name);
        self.propagate_outputs(&operation.stack_name, store).await
    }

    async fn delete(
        &self,
        operation: &StackOperation,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        let (recorded_stack, _) = store.stack_identifiers();
        if recorded_stack.is_none() {
            return Err(DeployError::PreconditionFailed(
                "project stack is not recorded in metadata; nothing to delete".to_string(),
            ));
        }

        info!("Deleting stack {}", operation.stack_name);

        self.client
            .describe_stacks(&operation.stack_name)
            .await
            .map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Describe,
                source,
            })?;

        self.client
            .delete_stack(&operation.stack_name)
            .await
            .map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Delete,
                source,
            })?;

        // Deletion shows no progress events; the waiter outcome alone
        // decides the result.
        self.await_completion(
            &operation.stack_name,
            WaitTarget::DeleteComplete,
            OperationPhase::Delete,
        )
        .await?;

        info!("Stack {} deleted", operation.stack_name);
        Ok(OutputMap::new())
    }

    fn spawn_monitor(&self, stack_name: &str, start_time: DateTime<Utc>) -> MonitorHandle {
        EventMonitor::new(
            Arc::clone(&self.client),
            stack_name,
            start_time,
            Arc::clone(&self.sink),
            self.config.poll_interval,
        )
        .spawn()
    }

    async fn await_completion(
        &self,
        stack_name: &str,
        target: WaitTarget,
        phase: OperationPhase,
    ) -> DeployResult<()> {
        debug!("Waiting for {} on {}", target.status(), stack_name);
        let wait = self.client.wait_for(stack_name, target);
        match tokio::time::timeout(self.config.operation_timeout, wait).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(DeployError::WaitFailed {
                phase,
                reason: source.to_string(),
            }),
            Err(_) => Err(DeployError::WaitFailed {
                phase,
                reason: format!("timed out after {:?}", self.config.operation_timeout),
            }),
        }
    }

    async fn propagate_outputs(
        &self,
        stack_name: &str,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        debug!("Propagating outputs for {}", stack_name);
        let propagator = OutputPropagator::new(
            Arc::clone(&self.client),
            self.config.deployment_bucket_logical_id.clone(),
        );
        propagator.propagate(stack_name, store).await
    }
}
