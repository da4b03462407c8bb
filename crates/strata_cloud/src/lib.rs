//! # strata_cloud
//!
//! Remote stack control-plane interface for Strata.
//!
//! This crate defines the narrow client surface the orchestrator talks to:
//! stack lifecycle requests, event and resource queries, terminal-status
//! waiters, and artifact upload. Real deployments plug in an SDK-backed
//! implementation; tests use the scripted mock shipped here.
//!
//! # Features
//!
//! - **StackClient**: async trait covering create/update/delete, event and
//!   resource queries, and terminal-status waits
//! - **ArtifactStore**: upload seam used by the update path
//! - **Typed events**: stack events carry identity, resource ids, status
//!   and timestamps for dedup and ordering downstream
//! - **Mock Client**: scripted event batches, captured calls, and failure
//!   injection for testing without a remote service
//!
//! # Example
//!
//! ```rust,no_run
//! use strata_cloud::{CreateStackRequest, MockStackClient, StackClient, WaitTarget};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MockStackClient::new();
//!
//!     let request = CreateStackRequest::new("app-dev", "https://artifacts.example.com/root.json")
//!         .capabilities(vec!["CAPABILITY_NAMED_IAM".to_string()]);
//!
//!     let stack_id = client.create_stack(&request).await?;
//!     client.wait_for("app-dev", WaitTarget::CreateComplete).await?;
//!     println!("Created {}", stack_id);
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{ArtifactStore, StackClient, WaitTarget};
pub use error::{CloudError, CloudResult};
pub use mock::{CapturedCall, MockArtifactStore, MockStackClient};
pub use types::{
    CreateStackRequest, Parameter, StackDescription, StackEvent, StackOutput, StackResource,
    UpdateStackRequest,
};
