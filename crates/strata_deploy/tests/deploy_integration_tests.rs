//! Integration tests for stack deployment orchestration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::tempdir;

use strata_cloud::{
    MockArtifactStore, MockStackClient, StackDescription, StackEvent, StackResource,
};
use strata_deploy::{
    DeployConfig, DeployError, MemorySink, OperationPhase, StackDeployer, StackOperation,
};
use strata_meta::{MetaStore, ProjectMeta, ProviderMeta};

const NESTED_AUTH_ID: &str =
    "arn:aws:cloudformation:us-east-1:123456789012:stack/app-dev-authUsers/11aa";

fn quick_config() -> DeployConfig {
    DeployConfig::default()
        .poll_interval(Duration::from_millis(20))
        .operation_timeout(Duration::from_secs(5))
}

/// Project metadata with recorded identifiers and two known resources.
fn initialized_meta() -> ProjectMeta {
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
    meta.categories
        .entry("storage".to_string())
        .or_default()
        .insert("Photos".to_string(), Default::default());
    meta
}

fn saved_store(path: &Path, meta: ProjectMeta) -> MetaStore {
    let store = MetaStore::new(path, meta);
    store.save().unwrap();
    store
}

fn event(
    id: &str,
    logical: &str,
    status: &str,
    offset_secs: i64,
) -> StackEvent {
    StackEvent::new(
        id,
        logical,
        "AWS::CloudFormation::Stack",
        status,
        Utc::now() + ChronoDuration::seconds(offset_secs),
    )
}

/// Test a full create workflow: events stream in from the root stack and a
/// discovered nested stack, and matched outputs land in the metadata file.
#[tokio::test]
async fn test_create_full_workflow() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());

    let nested_ref =
        event("evt-nested-ref", "authUsers", "CREATE_IN_PROGRESS", 120)
            .physical_resource_id(NESTED_AUTH_ID);
    let root_progress = event("evt-1", "app-dev", "CREATE_IN_PROGRESS", 60);
    let root_complete = event("evt-complete", "app-dev", "CREATE_COMPLETE", 300);

    let client = MockStackClient::new()
        .with_event_batches(vec![
            vec![root_progress.clone()],
            vec![root_progress.clone(), nested_ref.clone()],
            vec![root_progress, nested_ref, root_complete],
        ])
        .with_nested_events(
            NESTED_AUTH_ID,
            vec![event("evt-nested-1", "UserPool", "CREATE_COMPLETE", 180)],
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
                .output("UserPoolId", "pool-1")
                .output("AppClientId", "client-1"),
        )
        .with_wait_delay(Duration::from_millis(200));
    let sink = MemorySink::new();

    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(MockArtifactStore::new()))
        .with_sink(Arc::new(sink.clone()))
        .with_config(quick_config());

    let outputs = deployer
        .execute(
            StackOperation::create("app-dev", "https://artifacts.example.com/root.json"),
            &mut store,
        )
        .await
        .unwrap();

    // Propagated outputs cover only the matched (category, resource) pair.
    assert_eq!(outputs["auth"]["Users"].get("UserPoolId"), Some(&"pool-1".to_string()));
    assert!(!outputs.contains_key("storage"));

    // The metadata file was rewritten with the new outputs.
    let reloaded = MetaStore::load(&meta_path).unwrap();
    assert_eq!(
        reloaded.meta().categories["auth"]["Users"]
            .output
            .get("AppClientId"),
        Some(&"client-1".to_string())
    );
    assert!(reloaded.meta().categories["storage"]["Photos"].output.is_empty());
    assert_eq!(reloaded.stack_identifiers().0, Some("app-dev"));

    // Root and nested events rendered exactly once each.
    let ids = sink.event_ids();
    assert!(ids.contains(&"evt-1".to_string()));
    assert!(ids.contains(&"evt-nested-1".to_string()));
    assert!(ids.contains(&"evt-complete".to_string()));
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());

    // The deployment bucket is never an output source.
    let described: Vec<_> = client
        .get_method_calls("describe_stacks")
        .into_iter()
        .filter_map(|call| call.stack_name)
        .collect();
    assert!(!described.contains(&"app-dev-deployment".to_string()));
}

/// Test that create against an existing stack fails before any mutating
/// request and leaves the metadata file untouched.
#[tokio::test]
async fn test_create_on_existing_stack_fails_early() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());
    let before = fs::read_to_string(&meta_path).unwrap();

    let client = MockStackClient::new().with_stack(StackDescription::new("stack-1", "app-dev"));
    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(MockArtifactStore::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(
            StackOperation::create("app-dev", "https://artifacts.example.com/root.json"),
            &mut store,
        )
        .await;

    assert!(matches!(result, Err(DeployError::AlreadyExists(_))));
    assert!(!client.was_called("create_stack"));
    assert_eq!(fs::read_to_string(&meta_path).unwrap(), before);
}

/// Test that update with no recorded identifiers fails before any remote
/// call or upload.
#[tokio::test]
async fn test_update_without_identifiers_makes_no_remote_calls() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    saved_store(&meta_path, ProjectMeta::default());
    let mut store = MetaStore::load(&meta_path).unwrap();

    let client = MockStackClient::new();
    let artifacts = MockArtifactStore::new();
    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(artifacts.clone()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await;

    assert!(matches!(result, Err(DeployError::PreconditionFailed(_))));
    assert_eq!(client.call_count(), 0);
    assert_eq!(artifacts.upload_count(), 0);
}

/// Test that a failed template upload surfaces the upload phase and stops
/// before any stack request.
#[tokio::test]
async fn test_update_upload_failure_stops_before_stack_requests() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());
    let before = fs::read_to_string(&meta_path).unwrap();

    let client = MockStackClient::new().with_stack(StackDescription::new("stack-1", "app-dev"));
    let artifacts = MockArtifactStore::new().fail_with("bucket unreachable");
    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(artifacts))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await;

    match result {
        Err(DeployError::RemoteRequestFailed { phase, source }) => {
            assert_eq!(phase, OperationPhase::Upload);
            assert!(source.to_string().contains("bucket unreachable"));
        }
        other => panic!("Expected RemoteRequestFailed, got {:?}", other),
    }
    assert_eq!(client.call_count(), 0);
    assert_eq!(fs::read_to_string(&meta_path).unwrap(), before);
}

/// Test that an update against a stack deleted out of band fails on the
/// describe precheck, after the upload but before the update request.
#[tokio::test]
async fn test_update_describe_precheck_failure_surfaces_phase() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());

    // No stack registered, so the precheck describe reports not-found.
    let client = MockStackClient::new();
    let artifacts = MockArtifactStore::new();
    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(artifacts.clone()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await;

    match result {
        Err(DeployError::RemoteRequestFailed { phase, .. }) => {
            assert_eq!(phase, OperationPhase::Describe);
        }
        other => panic!("Expected RemoteRequestFailed, got {:?}", other),
    }
    assert_eq!(artifacts.upload_count(), 1);
    assert!(!client.was_called("update_stack"));
}

/// Test a full update workflow: template upload, update request with the
/// recorded bucket parameter, and output propagation.
#[tokio::test]
async fn test_update_full_workflow() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());

    let client = MockStackClient::new()
        .with_stack(StackDescription::new("stack-1", "app-dev"))
        .with_resources(
            "app-dev",
            vec![
                StackResource::new("authUsers", NESTED_AUTH_ID, "AWS::CloudFormation::Stack"),
                StackResource::new("DeploymentBucket", "app-dev-deployment", "AWS::S3::Bucket"),
            ],
        )
        .with_stack(
            StackDescription::new(NESTED_AUTH_ID, "app-dev-authUsers")
                .output("UserPoolId", "pool-1"),
        );
    let artifacts = MockArtifactStore::new();

    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(artifacts.clone()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let outputs = deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await
        .unwrap();

    assert_eq!(
        artifacts.uploaded_paths(),
        vec![PathBuf::from("build/root-stack.json")]
    );

    let calls = client.get_method_calls("update_stack");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].template_url.as_deref(),
        Some("https://artifacts.example.com/deployments/root-stack.json")
    );
    assert_eq!(
        calls[0].capabilities.as_deref(),
        Some(&["CAPABILITY_NAMED_IAM".to_string()][..])
    );
    let parameters = calls[0].parameters.as_ref().unwrap();
    assert!(parameters
        .iter()
        .any(|p| p.key == "DeploymentBucketName" && p.value == "app-dev-deployment"));

    assert_eq!(outputs["auth"]["Users"].get("UserPoolId"), Some(&"pool-1".to_string()));
    let reloaded = MetaStore::load(&meta_path).unwrap();
    assert_eq!(
        reloaded.meta().categories["auth"]["Users"]
            .output
            .get("UserPoolId"),
        Some(&"pool-1".to_string())
    );
}

/// Test that a delete whose waiter reports failure surfaces WaitFailed and
/// leaves the metadata file untouched.
#[tokio::test]
async fn test_delete_wait_failure_leaves_metadata_untouched() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());
    let before = fs::read_to_string(&meta_path).unwrap();

    let client = MockStackClient::new()
        .with_stack(StackDescription::new("stack-1", "app-dev"))
        .with_wait_failure("DELETE_FAILED");
    let deployer = StackDeployer::new(Arc::new(client), Arc::new(MockArtifactStore::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(StackOperation::delete("app-dev"), &mut store)
        .await;

    match result {
        Err(DeployError::WaitFailed { phase, reason }) => {
            assert_eq!(phase, OperationPhase::Delete);
            assert!(reason.contains("DELETE_FAILED"));
        }
        other => panic!("Expected WaitFailed, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&meta_path).unwrap(), before);
}

/// Test that delete with no recorded stack fails before any remote call.
#[tokio::test]
async fn test_delete_without_recorded_stack_fails_early() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, ProjectMeta::default());

    let client = MockStackClient::new().with_stack(StackDescription::new("stack-1", "app-dev"));
    let deployer = StackDeployer::new(Arc::new(client.clone()), Arc::new(MockArtifactStore::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    let result = deployer
        .execute(StackOperation::delete("app-dev"), &mut store)
        .await;

    assert!(matches!(result, Err(DeployError::PreconditionFailed(_))));
    assert_eq!(client.call_count(), 0);
}

/// Test that repeating an update with unchanged remote outputs rewrites the
/// metadata file byte-identically.
#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let temp = tempdir().unwrap();
    let meta_path = temp.path().join("project-meta.json");
    let mut store = saved_store(&meta_path, initialized_meta());

    let client = MockStackClient::new()
        .with_stack(StackDescription::new("stack-1", "app-dev"))
        .with_resources(
            "app-dev",
            vec![StackResource::new(
                "authUsers",
                NESTED_AUTH_ID,
                "AWS::CloudFormation::Stack",
            )],
        )
        .with_stack(
            StackDescription::new(NESTED_AUTH_ID, "app-dev-authUsers")
                .output("UserPoolId", "pool-1"),
        );
    let deployer = StackDeployer::new(Arc::new(client), Arc::new(MockArtifactStore::new()))
        .with_sink(Arc::new(MemorySink::new()))
        .with_config(quick_config());

    deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await
        .unwrap();
    let first = fs::read_to_string(&meta_path).unwrap();

    deployer
        .execute(
            StackOperation::update("app-dev", "build/root-stack.json"),
            &mut store,
        )
        .await
        .unwrap();
    let second = fs::read_to_string(&meta_path).unwrap();

    assert_eq!(first, second);
}
