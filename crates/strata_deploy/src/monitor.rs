//! Background event polling.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use strata_cloud::StackClient;

use crate::discover::{NestedStackDiscoverer, ResourceRef};
use crate::events::EventStore;
use crate::render::ProgressSink;

/// Background poller that streams progress events while an operation is in
/// flight.
///
/// The monitor ticks immediately, then on a fixed interval. Each tick
/// fetches the root stack's events, follows nested stacks referenced by the
/// new events, and publishes the deduplicated remainder sorted by
/// timestamp. Fetch failures are logged and swallowed; the loop retries on
/// the next tick. Exactly one monitor runs per operation.
pub struct EventMonitor {
    client: Arc<dyn StackClient>,
    stack_name: String,
    store: EventStore,
    discoverer: NestedStackDiscoverer,
    sink: Arc<dyn ProgressSink>,
    poll_interval: Duration,
}

/// Handle to a spawned monitor.
///
/// Stopping is consuming, so the stop signal is sent exactly once and the
/// task is always joined. Dropping the handle without calling `stop` closes
/// the channel, which ends the task the same way.
pub struct MonitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the monitor to stop and wait for its final sweep to finish.
    pub async fn stop(self) {
        // The receiver is gone if the task already exited; nothing to do then.
        let _ = self.stop_tx.send(true);
        if let Err(error) = self.task.await {
            warn!("Event monitor task failed: {}", error);
        }
    }
}

impl EventMonitor {
    /// Create a monitor for one operation on one root stack.
    pub fn new(
        client: Arc<dyn StackClient>,
        stack_name: impl Into<String>,
        start_time: DateTime<Utc>,
        sink: Arc<dyn ProgressSink>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            discoverer: NestedStackDiscoverer::new(Arc::clone(&client), start_time),
            client,
            stack_name: stack_name.into(),
            store: EventStore::new(start_time),
            sink,
            poll_interval,
        }
    }

    /// Run one poll cycle: fetch, discover, dedup, publish.
    pub async fn poll_once(&mut self) {
        let batch = match self.client.describe_stack_events(&self.stack_name).await {
            Ok(batch) => batch,
            Err(error) => {
                // The loop runs decoupled from the awaited operation, so a
                // failed fetch only skips this tick.
                warn!("Failed to fetch events for {}: {}", self.stack_name, error);
                return;
            }
        };

        if self.store.is_empty() {
            // First sighting renders the whole filtered history without
            // following nested stacks.
            let initial = self.store.absorb(batch);
            if !initial.is_empty() {
                self.sink.publish(&initial);
            }
            return;
        }

        let fresh = self.store.preview(&batch);
        if fresh.is_empty() {
            return;
        }

        // Follow nested stacks referenced by the new events, fetching each
        // one at most once per cycle.
        let mut cycle_seen: HashSet<String> = HashSet::new();
        let mut nested_ids: Vec<String> = Vec::new();
        for event in &fresh {
            if let ResourceRef::NestedStack(stack_id) = self.discoverer.classify(event) {
                if cycle_seen.insert(stack_id.clone()) {
                    nested_ids.push(stack_id);
                }
            }
        }

        let mut combined = batch;
        if !nested_ids.is_empty() {
            debug!(
                "Following {} nested stack(s) for {}",
                nested_ids.len(),
                self.stack_name
            );
            let results = join_all(
                nested_ids
                    .iter()
                    .map(|stack_id| self.discoverer.fetch_nested_events(stack_id)),
            )
            .await;
            for (stack_id, result) in nested_ids.iter().zip(results) {
                match result {
                    Ok(events) => combined.extend(events),
                    Err(error) => {
                        warn!("Failed to fetch nested stack events for {}: {}", stack_id, error);
                    }
                }
            }
        }

        let newly_shown = self.store.absorb(combined);
        if !newly_shown.is_empty() {
            self.sink.publish(&newly_shown);
        }
    }

    /// Spawn the monitor as a background task and return its handle.
    ///
    /// The task ticks immediately, then on the poll interval. On stop it
    /// runs one final best-effort sweep so events that arrived just before
    /// the terminal status still render; events arriving after that sweep
    /// are missed, which is accepted. The operation result, not the
    /// rendered log, is authoritative.
    pub fn spawn(mut self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let stack_name = self.stack_name.clone();
        let poll_interval = self.poll_interval;

        let task = tokio::spawn(async move {
            debug!("Event monitor started for {}", stack_name);
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.poll_once().await;
                    }
                    result = stop_rx.changed() => {
                        // Stop signal or dropped handle: run a final sweep
                        // and exit.
                        let _ = result;
                        self.poll_once().await;
                        break;
                    }
                }
            }
            debug!("Event monitor stopped for {}", stack_name);
        });

        MonitorHandle { stop_tx, task }
    }
}
