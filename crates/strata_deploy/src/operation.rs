//! Stack operation types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kind of lifecycle operation to run against the root stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

/// One stack lifecycle operation.
///
/// Built by the caller per invocation and immutable once issued; the
/// deployer owns it for the duration of the call. For create the template
/// location is a remote URL the request references directly; for update it
/// is a local path handed to the artifact store before the request is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOperation {
    /// What to do with the stack
    pub kind: OperationKind,
    /// Name of the root stack
    pub stack_name: String,
    /// Parameters passed with the remote request
    pub remote_parameters: BTreeMap<String, String>,
    /// Template location, interpreted per operation kind
    pub template_location: String,
}

impl StackOperation {
    pub fn create(stack_name: impl Into<String>, template_location: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Create,
            stack_name: stack_name.into(),
            remote_parameters: BTreeMap::new(),
            template_location: template_location.into(),
        }
    }

    pub fn update(stack_name: impl Into<String>, template_location: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Update,
            stack_name: stack_name.into(),
            remote_parameters: BTreeMap::new(),
            template_location: template_location.into(),
        }
    }

    pub fn delete(stack_name: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Delete,
            stack_name: stack_name.into(),
            remote_parameters: BTreeMap::new(),
            template_location: String::new(),
        }
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.remote_parameters.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_builders() {
        let create = StackOperation::create("app-dev", "https://example.com/root.json")
            .parameter("Env", "dev");
        assert_eq!(create.kind, OperationKind::Create);
        assert_eq!(create.remote_parameters.get("Env"), Some(&"dev".to_string()));

        let delete = StackOperation::delete("app-dev");
        assert_eq!(delete.kind, OperationKind::Delete);
        assert!(delete.template_location.is_empty());
    }
}
