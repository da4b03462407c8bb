//! Fixed-width rendering of progress events.

use std::sync::Arc;

use parking_lot::RwLock;

use strata_cloud::StackEvent;

/// Sink for rendered progress batches.
///
/// The monitor publishes each batch of newly observed events exactly once,
/// already deduplicated and sorted by timestamp.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, events: &[StackEvent]);
}

/// Format a batch as fixed-width rows in the order status, logical id,
/// resource type, timestamp, reason. No header row; columns are padded to
/// the widest cell of the batch.
pub fn format_rows(events: &[StackEvent]) -> Vec<String> {
    let rows: Vec<[String; 5]> = events
        .iter()
        .map(|event| {
            [
                event.resource_status.clone(),
                event.logical_resource_id.clone(),
                event.resource_type.clone(),
                event.timestamp.to_rfc3339(),
                event.resource_status_reason.clone().unwrap_or_default(),
            ]
        })
        .collect();

    let mut widths = [0usize; 5];
    for row in &rows {
        for (column, cell) in row.iter().enumerate() {
            widths[column] = widths[column].max(cell.len());
        }
    }

    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (column, cell) in row.iter().enumerate() {
                if column > 0 {
                    line.push(' ');
                }
                line.push_str(&format!("{:<width$}", cell, width = widths[column]));
            }
            line.trim_end().to_string()
        })
        .collect()
}

/// Sink that prints each batch to stdout, preceded by a blank line.
#[derive(Debug, Clone, Default)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for ConsoleSink {
    fn publish(&self, events: &[StackEvent]) {
        if events.is_empty() {
            return;
        }
        println!();
        for row in format_rows(events) {
            println!("{}", row);
        }
    }
}

/// Sink that records published batches in memory.
///
/// Used by tests and by embedders that render progress elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Arc<RwLock<Vec<Vec<StackEvent>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All published batches, in publish order.
    pub fn batches(&self) -> Vec<Vec<StackEvent>> {
        self.batches.read().clone()
    }

    /// Number of batches published so far.
    pub fn batch_count(&self) -> usize {
        self.batches.read().len()
    }

    /// Event ids across all batches, in publish order.
    pub fn event_ids(&self) -> Vec<String> {
        self.batches
            .read()
            .iter()
            .flatten()
            .map(|event| event.event_id.clone())
            .collect()
    }
}

impl ProgressSink for MemorySink {
    fn publish(&self, events: &[StackEvent]) {
        if events.is_empty() {
            return;
        }
        self.batches.write().push(events.to_vec());
    }
}
