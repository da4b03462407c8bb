//! Stack control-plane data types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A progress event emitted by the remote service for one stack resource.
///
/// Events are produced only by the remote service; the orchestrator collects
/// and orders them for display but never mutates them. Two events with the
/// same `event_id` are the same occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackEvent {
    /// Unique event identity assigned by the remote service
    pub event_id: String,
    /// Template-defined resource name
    pub logical_resource_id: String,
    /// Provisioned resource identifier
    pub physical_resource_id: String,
    /// Remote resource type
    pub resource_type: String,
    /// Status reported for the resource
    pub resource_status: String,
    /// Human-readable reason accompanying the status, if any
    pub resource_status_reason: Option<String>,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
}

impl StackEvent {
    pub fn new(
        event_id: impl Into<String>,
        logical_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
        resource_status: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            logical_resource_id: logical_resource_id.into(),
            physical_resource_id: String::new(),
            resource_type: resource_type.into(),
            resource_status: resource_status.into(),
            resource_status_reason: None,
            timestamp,
        }
    }

    pub fn physical_resource_id(mut self, id: impl Into<String>) -> Self {
        self.physical_resource_id = id.into();
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.resource_status_reason = Some(reason.into());
        self
    }
}

/// A provisioned resource belonging to a stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackResource {
    /// Template-defined resource name
    pub logical_resource_id: String,
    /// Provisioned resource identifier
    pub physical_resource_id: String,
    /// Remote resource type
    pub resource_type: String,
    /// Current resource status
    pub resource_status: String,
}

impl StackResource {
    pub fn new(
        logical_resource_id: impl Into<String>,
        physical_resource_id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            logical_resource_id: logical_resource_id.into(),
            physical_resource_id: physical_resource_id.into(),
            resource_type: resource_type.into(),
            resource_status: "CREATE_COMPLETE".to_string(),
        }
    }
}

/// A declared output of a deployed stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

impl StackOutput {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: None,
        }
    }
}

/// Description of a deployed stack as reported by the remote service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackDescription {
    /// Full remote identifier of the stack
    pub stack_id: String,
    /// Short stack name
    pub stack_name: String,
    /// Current stack status
    pub stack_status: String,
    /// Declared stack outputs
    pub outputs: Vec<StackOutput>,
}

impl StackDescription {
    pub fn new(stack_id: impl Into<String>, stack_name: impl Into<String>) -> Self {
        Self {
            stack_id: stack_id.into(),
            stack_name: stack_name.into(),
            stack_status: "CREATE_COMPLETE".to_string(),
            outputs: Vec::new(),
        }
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.stack_status = status.into();
        self
    }

    pub fn output(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.outputs.push(StackOutput::new(key, value));
        self
    }

    /// Flatten the declared outputs into a `{key: value}` map.
    pub fn output_map(&self) -> BTreeMap<String, String> {
        self.outputs
            .iter()
            .map(|output| (output.key.clone(), output.value.clone()))
            .collect()
    }
}

/// A template parameter passed with a create or update request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub key: String,
    pub value: String,
}

impl Parameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Request to create a new stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateStackRequest {
    /// Name of the stack to create
    pub stack_name: String,
    /// Location of the declarative template
    pub template_url: String,
    /// Template parameters
    pub parameters: Vec<Parameter>,
    /// Capabilities acknowledged for this request
    pub capabilities: Vec<String>,
}

impl CreateStackRequest {
    pub fn new(stack_name: impl Into<String>, template_url: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_url: template_url.into(),
            parameters: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(key, value));
        self
    }

    pub fn capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// Request to update an existing stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStackRequest {
    /// Name of the stack to update
    pub stack_name: String,
    /// Location of the uploaded template artifact
    pub template_url: String,
    /// Template parameters
    pub parameters: Vec<Parameter>,
    /// Capabilities acknowledged for this request
    pub capabilities: Vec<String>,
}

impl UpdateStackRequest {
    pub fn new(stack_name: impl Into<String>, template_url: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            template_url: template_url.into(),
            parameters: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(Parameter::new(key, value));
        self
    }

    pub fn capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_builder() {
        let request = CreateStackRequest::new("app-dev", "https://artifacts.example.com/root.json")
            .parameter("DeploymentBucketName", "app-dev-deployment")
            .capabilities(vec!["CAPABILITY_NAMED_IAM".to_string()]);

        assert_eq!(request.stack_name, "app-dev");
        assert_eq!(request.parameters.len(), 1);
        assert_eq!(request.parameters[0].key, "DeploymentBucketName");
        assert_eq!(request.capabilities, vec!["CAPABILITY_NAMED_IAM".to_string()]);
    }

    #[test]
    fn test_output_map_flattens_outputs() {
        let description = StackDescription::new("stack-id", "app-dev")
            .output("ApiUrl", "https://api.example.com")
            .output("Region", "us-east-1");

        let map = description.output_map();
        assert_eq!(map.get("ApiUrl"), Some(&"https://api.example.com".to_string()));
        assert_eq!(map.get("Region"), Some(&"us-east-1".to_string()));
    }

    #[test]
    fn test_event_builder_defaults() {
        let event = StackEvent::new(
            "evt-1",
            "AuthUsers",
            "AWS::CloudFormation::Stack",
            "CREATE_IN_PROGRESS",
            chrono::Utc::now(),
        );

        assert!(event.physical_resource_id.is_empty());
        assert!(event.resource_status_reason.is_none());
    }
}
