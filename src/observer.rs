//! Run-scoped observation of queue lifecycle events.
//!
//! The queue and its consumer report every state transition to an injected
//! [`Observer`], so a test (or any embedding) can capture a run
//! deterministically instead of scraping log output. Events carry no
//! payload: the queue treats items as opaque and never inspects them.

use std::sync::Mutex;

/// Why an item was turned away at admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The buffer stayed full for the whole admission wait.
    Full,
    /// Shutdown had already been requested.
    ShuttingDown,
}

/// Lifecycle events emitted by the queue and its consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueEvent {
    /// An item was appended to the buffer.
    Accepted,
    /// An item was turned away at admission.
    Rejected(RejectReason),
    /// The owner requested shutdown. Emitted once, by the first call only.
    ShutdownRequested,
    /// The consumer removed an item from the buffer.
    Taken,
    /// The consumer finished processing an item.
    Processed,
    /// The consumer observed shutdown and left its loop. Terminal.
    ShutdownObserved,
}

/// Receives every [`QueueEvent`] of a run.
///
/// Implementations are called from producer threads and the consumer thread
/// concurrently, with no lock held.
pub trait Observer: Send + Sync {
    fn observe(&self, event: QueueEvent);
}

/// Discards every event. The default when no observer is injected.
pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&self, _event: QueueEvent) {}
}

/// Records events in arrival order for later inspection.
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<QueueEvent>>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event observed so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.lock().expect("event log mutex poisoned").clone()
    }

    /// How many times `event` has been observed.
    #[must_use]
    pub fn count(&self, event: QueueEvent) -> usize {
        self.events
            .lock()
            .expect("event log mutex poisoned")
            .iter()
            .filter(|&&e| e == event)
            .count()
    }
}

impl Observer for EventLog {
    fn observe(&self, event: QueueEvent) {
        self.events.lock().expect("event log mutex poisoned").push(event);
    }
}
