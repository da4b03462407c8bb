//! Example: Deploying a stack against the mock control plane
//!
//! This example drives a full create deployment with scripted remote
//! responses: progress events stream to the console while the operation is
//! in flight, and the propagated outputs land in a metadata file under a
//! temporary directory.
//!
//! Run with: cargo run --example mock_deploy

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use strata_cloud::{
    MockArtifactStore, MockStackClient, StackDescription, StackEvent, StackResource,
};
use strata_deploy::{DeployConfig, StackDeployer, StackOperation};
use strata_meta::{MetaStore, ProjectMeta, ProviderMeta};

const NESTED_AUTH_ID: &str =
    "arn:aws:cloudformation:us-east-1:123456789012:stack/app-dev-authUsers/11aa";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(
            EnvFilter::from_default_env()
                .add_directive("strata=info".parse().unwrap())
                .add_directive("warn".parse().unwrap()),
        )
        .try_init();
    if log_result.is_err() {
        // Logging already initialized, continue
    }

    println!("=== Strata Mock Deployment Example ===");

    let client = scripted_client();
    let deployer = StackDeployer::new(Arc::new(client), Arc::new(MockArtifactStore::new()))
        .with_config(
            DeployConfig::default()
                .poll_interval(Duration::from_millis(100))
                .operation_timeout(Duration::from_secs(10)),
        );

    let temp = tempfile::tempdir()?;
    let meta_path = temp.path().join("project-meta.json");
    let mut store = MetaStore::new(&meta_path, project_meta());
    store.save()?;

    let operation = StackOperation::create("app-dev", "https://artifacts.example.com/root.json");
    let outputs = deployer.execute(operation, &mut store).await?;

    println!("\nPropagated outputs:");
    for (category, resources) in &outputs {
        for (resource, values) in resources {
            println!("  {}/{}:", category, resource);
            for (key, value) in values {
                println!("    {} = {}", key, value);
            }
        }
    }

    println!("\nMetadata file:");
    println!("{}", std::fs::read_to_string(&meta_path)?);

    Ok(())
}

/// Project metadata with one known auth resource.
fn project_meta() -> ProjectMeta {
    let mut meta = ProjectMeta {
        provider: Some(ProviderMeta {
            stack_name: Some("app-dev".to_string()),
            deployment_bucket: Some("app-dev-deployment".to_string()),
            region: Some("us-east-1".to_string()),
        }),
        ..Default::default()
    };
    meta.categories
        .entry("auth".to_string())
        .or_default()
        .insert("Users".to_string(), Default::default());
    meta
}

/// Mock client scripted with a short create timeline, one nested stack and
/// the resources needed for output propagation.
fn scripted_client() -> MockStackClient {
    let base = Utc::now();
    let event = |id: &str, logical: &str, kind: &str, status: &str, offset: i64| {
        StackEvent::new(id, logical, kind, status, base + ChronoDuration::seconds(offset))
    };

    let root_start = event(
        "evt-1",
        "app-dev",
        "AWS::CloudFormation::Stack",
        "CREATE_IN_PROGRESS",
        60,
    );
    let bucket = event(
        "evt-2",
        "DeploymentBucket",
        "AWS::S3::Bucket",
        "CREATE_COMPLETE",
        90,
    )
    .reason("Resource creation Initiated");
    let nested_ref = event(
        "evt-3",
        "authUsers",
        "AWS::CloudFormation::Stack",
        "CREATE_IN_PROGRESS",
        120,
    )
    .physical_resource_id(NESTED_AUTH_ID);
    let root_done = event(
        "evt-4",
        "app-dev",
        "AWS::CloudFormation::Stack",
        "CREATE_COMPLETE",
        300,
    );

    MockStackClient::new()
        .with_event_batches(vec![
            vec![root_start.clone()],
            vec![root_start.clone(), bucket.clone(), nested_ref.clone()],
            vec![root_start, bucket, nested_ref, root_done],
        ])
        .with_nested_events(
            NESTED_AUTH_ID,
            vec![event(
                "evt-nested-1",
                "UserPool",
                "AWS::Cognito::UserPool",
                "CREATE_COMPLETE",
                180,
            )],
        )
        .with_resources(
            "app-dev",
            vec![
                StackResource::new("authUsers", NESTED_AUTH_ID, "AWS::CloudFormation::Stack"),
                StackResource::new("DeploymentBucket", "app-dev-deployment", "AWS::S3::Bucket"),
            ],
        )
        .with_stack(
            StackDescription::new(NESTED_AUTH_ID, "app-dev-authUsers")
                .output("UserPoolId", "us-east-1_Example1")
                .output("AppClientId", "4example9example1example"),
        )
        .with_wait_delay(Duration::from_millis(400))
}
