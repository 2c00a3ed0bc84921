//! Event sinks receiving occupancy notifications.
//!
//! The allocator calls the sink from every gate worker concurrently and
//! outside the ledger lock. A sink that fails, panics, or stalls degrades
//! throughput on its gate but never changes an operation's result.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use super::record::{OccupancyRecord, Outcome};
use crate::util::clock::now_ms;

/// Receiver of allocator state transitions.
///
/// Implementations must tolerate concurrent calls; the allocator does not
/// serialize them across gates.
#[async_trait]
pub trait EventSink: Send + Sync + 'static {
    /// Record a transition. Returning `false` reports a delivery failure,
    /// which the allocator logs and otherwise ignores.
    async fn notify(&self, record: &OccupancyRecord, outcome: Outcome) -> bool;
}

/// Sink that writes each event to the `tracing` pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn notify(&self, record: &OccupancyRecord, outcome: Outcome) -> bool {
        match serde_json::to_string(record) {
            Ok(json) => {
                info!(
                    target: "parking_events",
                    event = ?outcome,
                    resource_id = record.resource_id(),
                    record = %json,
                    "occupancy event"
                );
                true
            }
            Err(_) => false,
        }
    }
}

/// One delivered notification.
#[derive(Debug, Clone)]
pub struct SinkEvent {
    /// Record as it stood when the event fired.
    pub record: OccupancyRecord,
    /// What happened.
    pub outcome: Outcome,
    /// Delivery time, milliseconds since the Unix epoch.
    pub recorded_at_ms: u128,
}

/// In-memory sink for testing and dev; keeps the newest `max_events`.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<SinkEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Resource ids of stored events with the given outcome, in delivery order.
    pub fn resource_ids_with(&self, outcome: Outcome) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.outcome == outcome)
            .map(|e| e.record.resource_id().to_owned())
            .collect()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl std::fmt::Debug for InMemoryEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryEventSink")
            .field("len", &self.len())
            .field("max_events", &self.max_events)
            .finish()
    }
}

#[async_trait]
impl EventSink for InMemoryEventSink {
    async fn notify(&self, record: &OccupancyRecord, outcome: Outcome) -> bool {
        if self.max_events == 0 {
            return true;
        }
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(SinkEvent {
            record: record.clone(),
            outcome,
            recorded_at_ms: now_ms(),
        });
        true
    }
}
