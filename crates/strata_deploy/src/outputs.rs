//! Resource output propagation.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::debug;

use strata_cloud::StackClient;
use strata_meta::{MetaStore, ResourceOutputs};

use crate::error::{DeployError, DeployResult, OperationPhase};

/// Outputs gathered by one propagation run, keyed by category and resource
/// name.
pub type OutputMap = BTreeMap<String, BTreeMap<String, ResourceOutputs>>;

/// Copies stack outputs into project metadata after a successful
/// deployment.
///
/// Every resource of the root stack except the deployment bucket is
/// described for its outputs, then matched against the project's known
/// `(category, resource)` pairs by concatenating each pair into a logical
/// resource id. Unmatched resources are ignored. Writes overwrite prior
/// values, so running propagation twice against unchanged remote outputs
/// leaves the metadata file unchanged.
pub struct OutputPropagator {
    client: Arc<dyn StackClient>,
    excluded_logical_id: String,
}

impl OutputPropagator {
    /// Create a propagator that skips the named logical resource.
    pub fn new(client: Arc<dyn StackClient>, excluded_logical_id: impl Into<String>) -> Self {
        Self {
            client,
            excluded_logical_id: excluded_logical_id.into(),
        }
    }

    /// Fetch outputs for the stack's resources and write matches into the
    /// metadata store.
    ///
    /// All describe calls complete before the first write, so a fetch
    /// failure leaves the store untouched.
    pub async fn propagate(
        &self,
        stack_name: &str,
        store: &mut MetaStore,
    ) -> DeployResult<OutputMap> {
        let resources = self
            .client
            .describe_stack_resources(stack_name)
            .await
            .map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Outputs,
                source,
            })?;
        let resources: Vec<_> = resources
            .into_iter()
            .filter(|resource| resource.logical_resource_id != self.excluded_logical_id)
            .collect();

        let results = join_all(
            resources
                .iter()
                .map(|resource| self.client.describe_stacks(&resource.physical_resource_id)),
        )
        .await;

        let mut described: Vec<(String, ResourceOutputs)> = Vec::with_capacity(resources.len());
        for (resource, result) in resources.into_iter().zip(results) {
            let description = result.map_err(|source| DeployError::RemoteRequestFailed {
                phase: OperationPhase::Outputs,
                source,
            })?;
            described.push((resource.logical_resource_id, description.output_map()));
        }

        let mut propagated = OutputMap::new();
        for (category, resource_name) in store.resource_pairs() {
            let logical_id = format!("{}{}", category, resource_name);
            if let Some((_, outputs)) = described.iter().find(|(id, _)| *id == logical_id) {
                debug!("Propagating outputs for {}/{}", category, resource_name);
                store.write_resource_outputs(&category, &resource_name, outputs.clone())?;
                propagated
                    .entry(category)
                    .or_default()
                    .insert(resource_name, outputs.clone());
            }
        }
        Ok(propagated)
    }
}
