//! Event collection, deduplication, and ordering.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use strata_cloud::StackEvent;

/// Deduplicated record of the progress events shown for one operation.
///
/// The store keeps the ids of every event shown so far and the operation
/// start time. `absorb` is the only way in: it drops events at or before
/// the start time, drops ids already shown, dedups within the batch, and
/// returns the remainder sorted by timestamp ascending. Events from prior
/// operations can therefore never surface, and no id is ever returned
/// twice. The store lives for one operation and is discarded with it.
#[derive(Debug)]
pub struct EventStore {
    shown: HashSet<String>,
    start_time: DateTime<Utc>,
}

impl EventStore {
    /// Create a store for an operation that started at the given time.
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            shown: HashSet::new(),
            start_time,
        }
    }

    /// The operation start time events are filtered against.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    /// True until the first non-empty batch has been absorbed.
    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }

    /// Number of events shown so far.
    pub fn len(&self) -> usize {
        self.shown.len()
    }

    /// The events of a batch that `absorb` would accept, without recording
    /// them. Used to decide which new events warrant nested-stack discovery
    /// before the combined batch is absorbed.
    pub fn preview(&self, batch: &[StackEvent]) -> Vec<StackEvent> {
        batch
            .iter()
            .filter(|event| {
                event.timestamp > self.start_time && !self.shown.contains(&event.event_id)
            })
            .cloned()
            .collect()
    }

    /// Record the not-yet-shown events of a batch and return them sorted by
    /// timestamp ascending.
    pub fn absorb(&mut self, batch: Vec<StackEvent>) -> Vec<StackEvent> {
        let start_time = self.start_time;
        let mut fresh: Vec<StackEvent> = batch
            .into_iter()
            .filter(|event| event.timestamp > start_time)
            .filter(|event| self.shown.insert(event.event_id.clone()))
            .collect();
        fresh.sort_by_key(|event| event.timestamp);
        fresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(id: &str, offset_secs: i64, base: DateTime<Utc>) -> StackEvent {
        StackEvent::new(
            id,
            "AuthUsers",
            "AWS::CloudFormation::Stack",
            "CREATE_IN_PROGRESS",
            base + Duration::seconds(offset_secs),
        )
    }

    #[test]
    fn test_absorb_drops_events_before_start_time() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let batch = vec![event("old", -30, start), event("new", 10, start)];
        let shown = store.absorb(batch);

        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].event_id, "new");
    }

    #[test]
    fn test_absorb_drops_boundary_timestamp() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let shown = store.absorb(vec![event("exact", 0, start)]);
        assert!(shown.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_absorb_dedups_across_batches() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let first = store.absorb(vec![event("a", 1, start), event("b", 2, start)]);
        assert_eq!(first.len(), 2);

        let second = store.absorb(vec![
            event("a", 1, start),
            event("b", 2, start),
            event("c", 3, start),
        ]);
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].event_id, "c");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_absorb_dedups_within_batch() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let shown = store.absorb(vec![
            event("a", 1, start),
            event("a", 1, start),
            event("b", 2, start),
        ]);
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn test_absorb_sorts_by_timestamp() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let shown = store.absorb(vec![
            event("late", 30, start),
            event("early", 5, start),
            event("middle", 15, start),
        ]);

        let ids: Vec<&str> = shown.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_preview_does_not_record() {
        let start = Utc::now();
        let mut store = EventStore::new(start);

        let batch = vec![event("a", 1, start)];
        let previewed = store.preview(&batch);
        assert_eq!(previewed.len(), 1);
        assert!(store.is_empty());

        // A later absorb still accepts the previewed event.
        assert_eq!(store.absorb(batch).len(), 1);
    }

    #[test]
    fn test_preview_filters_shown_and_stale() {
        let start = Utc::now();
        let mut store = EventStore::new(start);
        store.absorb(vec![event("a", 1, start)]);

        let previewed = store.preview(&[
            event("a", 1, start),
            event("old", -5, start),
            event("b", 2, start),
        ]);
        assert_eq!(previewed.len(), 1);
        assert_eq!(previewed[0].event_id, "b");
    }
}
