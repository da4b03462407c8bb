//! Metadata file persistence.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{MetaError, MetaResult};
use crate::models::{ProjectMeta, ResourceOutputs};

/// File-backed store for project metadata.
///
/// The store holds the parsed metadata in memory and writes the file back
/// on every resource-output update, so the on-disk state always reflects
/// the last completed write. Keys serialize in stable order, which keeps
/// repeated writes of unchanged data byte-identical.
pub struct MetaStore {
    path: PathBuf,
    meta: ProjectMeta,
}

impl MetaStore {
    /// Load project metadata from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> MetaResult<Self> {
        let path = path.as_ref();
        debug!("Loading project metadata from {:?}", path);

        if !path.exists() {
            return Err(MetaError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let meta: ProjectMeta = serde_json::from_str(&content)?;
        Ok(Self {
            path: path.to_path_buf(),
            meta,
        })
    }

    /// Create a store around in-memory metadata; nothing is written until
    /// the first save.
    pub fn new(path: impl AsRef<Path>, meta: ProjectMeta) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            meta,
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current metadata.
    pub fn meta(&self) -> &ProjectMeta {
        &self.meta
    }

    /// Read the recorded root stack identifiers as
    /// `(stack name, deployment bucket)`.
    pub fn stack_identifiers(&self) -> (Option<&str>, Option<&str>) {
        (self.meta.stack_name(), self.meta.deployment_bucket())
    }

    /// All known `(category, resource)` pairs.
    pub fn resource_pairs(&self) -> Vec<(String, String)> {
        self.meta.resource_pairs()
    }

    /// Record the outputs of one resource and persist the file.
    pub fn write_resource_outputs(
        &mut self,
        category: &str,
        resource: &str,
        outputs: ResourceOutputs,
    ) -> MetaResult<()> {
        debug!("Recording outputs for {}/{}", category, resource);
        self.meta.set_resource_outputs(category, resource, outputs);
        self.save()
    }

    /// Write the metadata file.
    pub fn save(&self) -> MetaResult<()> {
        debug!("Writing project metadata to {:?}", self.path);
        let content = serde_json::to_string_pretty(&self.meta)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
