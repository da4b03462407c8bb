//! Nested stack discovery.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;

use strata_cloud::{CloudResult, StackClient, StackEvent};

/// How the resource behind an event is treated by the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    /// An ordinary resource with no event history of its own.
    Plain,
    /// A nested stack worth following, carrying its stack id.
    NestedStack(String),
}

/// Classifies event resources and fetches nested stack histories.
///
/// Classification keys off the physical resource id shape alone. That is a
/// heuristic, not a type check: malformed or partial ids classify as plain
/// and are skipped, never failing the poll tick they appeared in.
pub struct NestedStackDiscoverer {
    client: Arc<dyn StackClient>,
    start_time: DateTime<Utc>,
    stack_id_shape: Regex,
}

impl NestedStackDiscoverer {
    pub fn new(client: Arc<dyn StackClient>, start_time: DateTime<Utc>) -> Self {
        Self {
            client,
            start_time,
            // Stack ids look like arn:<partition>:cloudformation:<region>:<account>:stack/<name>/<uuid>
            stack_id_shape: Regex::new(r"^arn:[^:]+:cloudformation:[^:]*:[^:]*:stack/").unwrap(),
        }
    }

    /// Classify the resource an event points at, once per event.
    pub fn classify(&self, event: &StackEvent) -> ResourceRef {
        let physical_id = &event.physical_resource_id;
        if self.stack_id_shape.is_match(physical_id) {
            ResourceRef::NestedStack(physical_id.clone())
        } else {
            ResourceRef::Plain
        }
    }

    /// Fetch a nested stack's event history, filtered to events belonging
    /// to this operation.
    pub async fn fetch_nested_events(&self, stack_id: &str) -> CloudResult<Vec<StackEvent>> {
        let events = self.client.describe_stack_events(stack_id).await?;
        let start_time = self.start_time;
        Ok(events
            .into_iter()
            .filter(|event| event.timestamp > start_time)
            .collect())
    }
}
