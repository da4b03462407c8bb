//! Data models for persisted project metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Flattened `{output key: output value}` pairs of one deployed resource.
pub type ResourceOutputs = BTreeMap<String, String>;

/// Provider-level identifiers recorded when the project stack is first set up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMeta {
    /// Name of the root deployment stack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
    /// Bucket holding uploaded deployment artifacts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_bucket: Option<String>,
    /// Remote region the stack lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Metadata recorded for one project resource.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceMeta {
    /// Backing service for the resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Outputs propagated from the deployed stack
    #[serde(default)]
    pub output: ResourceOutputs,
}

/// Persisted project metadata.
///
/// Categories map resource names to their recorded metadata. The provider
/// section carries the root stack identifiers and stays absent until the
/// project has been initialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderMeta>,
    #[serde(default)]
    pub categories: BTreeMap<String, BTreeMap<String, ResourceMeta>>,
}

impl ProjectMeta {
    /// The recorded root stack name. Empty strings count as absent.
    pub fn stack_name(&self) -> Option<&str> {
        self.provider
            .as_ref()
            .and_then(|provider| provider.stack_name.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// The recorded deployment bucket. Empty strings count as absent.
    pub fn deployment_bucket(&self) -> Option<&str> {
        self.provider
            .as_ref()
            .and_then(|provider| provider.deployment_bucket.as_deref())
            .filter(|bucket| !bucket.is_empty())
    }

    /// All known `(category, resource)` pairs.
    pub fn resource_pairs(&self) -> Vec<(String, String)> {
        self.categories
            .iter()
            .flat_map(|(category, resources)| {
                resources
                    .keys()
                    .map(move |resource| (category.clone(), resource.clone()))
            })
            .collect()
    }

    /// Record the outputs of one resource, creating entries as needed.
    pub fn set_resource_outputs(
        &mut self,
        category: &str,
        resource: &str,
        outputs: ResourceOutputs,
    ) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .entry(resource.to_string())
            .or_default()
            .output = outputs;
    }
}
