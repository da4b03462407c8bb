//! Deployment configuration.

use std::time::Duration;

/// Configuration for stack operations and event polling.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Interval between event polls
    pub poll_interval: Duration,
    /// Upper bound on one stack operation, waiter included
    pub operation_timeout: Duration,
    /// Capabilities acknowledged on create and update requests
    pub capabilities: Vec<String>,
    /// Logical id of the deployment bucket resource, never an output source
    pub deployment_bucket_logical_id: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            operation_timeout: Duration::from_secs(3600), // 1 hour
            capabilities: vec!["CAPABILITY_NAMED_IAM".to_string()],
            deployment_bucket_logical_id: "DeploymentBucket".to_string(),
        }
    }
}

impl DeployConfig {
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn deployment_bucket_logical_id(mut self, id: impl Into<String>) -> Self {
        self.deployment_bucket_logical_id = id.into();
        self
    }
}
