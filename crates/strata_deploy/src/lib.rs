//! # strata_deploy
//!
//! Stack deployment orchestration for Strata.
//!
//! This crate drives the full lifecycle of a remote infrastructure stack
//! (create, update, delete) while a background monitor streams progress
//! events, including events from dynamically discovered nested stacks.
//! After a successful deployment, resource outputs are propagated into the
//! persisted project metadata.
//!
//! ## Features
//!
//! - Create, update and delete operations with precondition checks
//! - Background event polling with dedup and timestamp ordering
//! - Nested stack discovery by resource identifier shape
//! - Fixed-width progress rendering without header rows
//! - Output propagation keyed by `(category, resource)` pairs
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use strata_cloud::{MockArtifactStore, MockStackClient};
//! use strata_deploy::{StackDeployer, StackOperation};
//! use strata_meta::{MetaStore, ProjectMeta};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(MockStackClient::new());
//!     let artifacts = Arc::new(MockArtifactStore::new());
//!     let deployer = StackDeployer::new(client, artifacts);
//!
//!     let mut store = MetaStore::new("project-meta.json", ProjectMeta::default());
//!     let operation = StackOperation::create("app-dev", "https://example.com/template.json");
//!     let outputs = deployer.execute(operation, &mut store).await?;
//!     println!("{} categories updated", outputs.len());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod deployer;
pub mod discover;
pub mod error;
pub mod events;
pub mod monitor;
pub mod operation;
pub mod outputs;
pub mod render;

pub use config::DeployConfig;
pub use deployer::StackDeployer;
pub use discover::{NestedStackDiscoverer, ResourceRef};
pub use error::{DeployError, DeployResult, OperationPhase};
pub use events::EventStore;
pub use monitor::{EventMonitor, MonitorHandle};
pub use operation::{OperationKind, StackOperation};
pub use outputs::{OutputMap, OutputPropagator};
pub use render::{format_rows, ConsoleSink, MemorySink, ProgressSink};
