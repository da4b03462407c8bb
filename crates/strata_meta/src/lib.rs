//! # strata_meta
//!
//! Persisted project metadata store for Strata.
//!
//! Deployments read the root stack identifiers from here and write resource
//! outputs back after a successful operation. The backing format is a single
//! JSON file with stable key ordering.

pub mod error;
pub mod models;
pub mod store;

pub use error::{MetaError, MetaResult};
pub use models::{ProjectMeta, ProviderMeta, ResourceMeta, ResourceOutputs};
pub use store::MetaStore;
