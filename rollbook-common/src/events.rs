//! Event types and event bus for the Rollbook service
//!
//! Events are notification-only: they carry progress and lifecycle
//! information to SSE subscribers. No component reads writable state
//! back out of the bus; the database remains the single source of truth.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Rollbook event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RollbookEvent {
    /// An ingestion run started (batch row created, inserts about to begin)
    IngestStarted {
        batch_id: Uuid,
        batch_name: String,
        total_to_insert: usize,
        timestamp: DateTime<Utc>,
    },

    /// A chunk committed; inserted count is monotonic within one run
    IngestProgress {
        batch_id: Uuid,
        inserted_so_far: usize,
        total_to_insert: usize,
        timestamp: DateTime<Utc>,
    },

    /// Ingestion run finished (fully or partially)
    IngestCompleted {
        batch_id: Uuid,
        total_inserted: usize,
        total_errors: usize,
        total_duplicates: usize,
        aborted: bool,
        timestamp: DateTime<Utc>,
    },

    /// A single record moved through the approval state machine
    RecordTransitioned {
        submission_id: Uuid,
        action: String,
        new_status: String,
        performed_by: String,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast-based event bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RollbookEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RollbookEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` when nobody is listening.
    /// Progress events are advisory; callers may ignore the result.
    pub fn emit(
        &self,
        event: RollbookEvent,
    ) -> std::result::Result<usize, broadcast::error::SendError<RollbookEvent>> {
        self.tx.send(event)
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emit_reaches_subscriber() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let batch_id = Uuid::new_v4();
        bus.emit(RollbookEvent::IngestProgress {
            batch_id,
            inserted_so_far: 100,
            total_to_insert: 120,
            timestamp: Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            RollbookEvent::IngestProgress {
                batch_id: got,
                inserted_so_far,
                ..
            } => {
                assert_eq!(got, batch_id);
                assert_eq!(inserted_so_far, 100);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn emit_without_subscribers_is_an_error() {
        let bus = EventBus::new(4);
        let result = bus.emit(RollbookEvent::IngestCompleted {
            batch_id: Uuid::new_v4(),
            total_inserted: 0,
            total_errors: 0,
            total_duplicates: 0,
            aborted: false,
            timestamp: Utc::now(),
        });
        assert!(result.is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }
}
