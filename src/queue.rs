//! Bounded rendezvous queue between many producers and a single consumer.
//!
//! # Overview
//!
//! - [`RendezvousQueue::enqueue`] - producer admission with a bounded wait
//! - [`RendezvousQueue::shutdown`] - one-shot, idempotent stop request
//! - [`RendezvousQueue::wait_and_take`] - single-consumer wait for the next
//!   item or the shutdown notice
//! - [`RendezvousQueue::run`] - consumer loop driving a processing callback
//!
//! # Wake protocol
//!
//! Every accepted item posts the ready signal exactly once, and the first
//! `shutdown` call posts it exactly once more. The consumer pairs each wake
//! with exactly one pop-or-stop decision under the buffer lock, so wakeups
//! are never lost and never duplicated: a wake always finds either the item
//! that posted it or the shutdown flag. Anything else is a [`SignalError`]
//! and ends the run.
//!
//! # Example
//!
//! ```
//! use lectern::queue::{RendezvousQueue, Taken, Timeout};
//!
//! let queue = RendezvousQueue::new(2);
//! queue.enqueue("first", Timeout::Infinite).unwrap();
//! queue.enqueue("second", Timeout::Infinite).unwrap();
//! queue.shutdown();
//!
//! assert_eq!(queue.wait_and_take().unwrap(), Taken::Item("first"));
//! assert_eq!(queue.wait_and_take().unwrap(), Taken::Item("second"));
//! assert_eq!(queue.wait_and_take().unwrap(), Taken::Shutdown);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

use minstant::Instant;
use thiserror::Error;

use crate::observer::{NullObserver, Observer, QueueEvent, RejectReason};
use crate::sync::Semaphore;
use crate::trace::{debug, error, info, warn};

/// Timeout specification for the admission wait.
#[derive(Debug, Clone, Copy)]
pub enum Timeout {
    /// Wait indefinitely.
    Infinite,
    /// Wait for at most the specified duration.
    Duration(Duration),
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Self::Duration(d)
    }
}

/// Outcome of one consumer wait.
#[derive(Debug, PartialEq, Eq)]
pub enum Taken<T> {
    /// The oldest pending item.
    Item(T),
    /// Shutdown was requested and the buffer is drained. Terminal.
    Shutdown,
}

/// An enqueue that was turned away. The rejected item rides along so the
/// caller can retry it or drop it.
#[derive(Debug, Error)]
pub enum EnqueueError<T> {
    /// The buffer stayed full for the whole admission wait.
    #[error("queue full, admission timed out")]
    Full(T),
    /// Shutdown has been requested; no further items are admitted.
    #[error("queue is shutting down")]
    ShuttingDown(T),
}

impl<T> EnqueueError<T> {
    /// Recovers the rejected item.
    pub fn into_item(self) -> T {
        match self {
            Self::Full(item) | Self::ShuttingDown(item) => item,
        }
    }

    /// Why the enqueue was rejected.
    pub fn reason(&self) -> RejectReason {
        match self {
            Self::Full(_) => RejectReason::Full,
            Self::ShuttingDown(_) => RejectReason::ShuttingDown,
        }
    }
}

/// A wake signal arrived with nothing to take and no shutdown request.
///
/// The wake protocol guarantees this cannot happen; observing it means
/// signal accounting has been violated somewhere and the run must stop.
/// Callers must surface it, never retry it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("wake signal with no pending item and no shutdown request")]
pub struct SignalError;

/// Buffer state guarded by the queue mutex.
struct State<T> {
    pending: VecDeque<T>,
    shutting_down: bool,
}

/// Bounded FIFO buffer pairing concurrent producers with a single consumer.
///
/// Producers block in [`enqueue`](Self::enqueue) while the buffer is full
/// (bounded by the given timeout); the consumer blocks in
/// [`wait_and_take`](Self::wait_and_take) while nothing is pending. Once
/// [`shutdown`](Self::shutdown) is requested the flag never reverts, and
/// the consumer is guaranteed one final wake to observe it.
pub struct RendezvousQueue<T> {
    state: Mutex<State<T>>,
    /// Producers park here while the buffer is full.
    space: Condvar,
    /// One permit per pending item, plus one for a pending shutdown notice.
    ready: Semaphore,
    capacity: usize,
    observer: Arc<dyn Observer>,
}

impl<T> RendezvousQueue<T> {
    /// Creates a queue holding at most `capacity` pending items.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_observer(capacity, Arc::new(NullObserver))
    }

    /// Creates a queue that reports lifecycle events to `observer`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_observer(capacity: usize, observer: Arc<dyn Observer>) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            state: Mutex::new(State {
                pending: VecDeque::with_capacity(capacity),
                shutting_down: false,
            }),
            space: Condvar::new(),
            ready: Semaphore::new(0),
            capacity,
            observer,
        }
    }

    /// Maximum number of pending items.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock_state().pending.len()
    }

    /// Whether the buffer is currently empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.lock_state().shutting_down
    }

    fn lock_state(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().expect("queue mutex poisoned")
    }

    /// Attempts to append `item` to the buffer, waiting up to `timeout` for
    /// space while the buffer is full.
    ///
    /// On success the consumer wake signal is posted exactly once, after
    /// the item is observably in the buffer. On rejection nothing is
    /// mutated and nothing is posted; the item is handed back inside the
    /// error.
    ///
    /// Safe to call from any number of producer threads concurrently.
    /// Admission order is the order in which producers win the buffer lock.
    ///
    /// # Errors
    ///
    /// - [`EnqueueError::Full`] if the buffer stayed full for the whole
    ///   wait.
    /// - [`EnqueueError::ShuttingDown`] if shutdown has been requested,
    ///   whether before the call or while parked waiting for space.
    pub fn enqueue(&self, item: T, timeout: Timeout) -> Result<(), EnqueueError<T>> {
        let deadline = match timeout {
            Timeout::Infinite => None,
            Timeout::Duration(d) => Some(Instant::now() + d),
        };

        let mut state = self.lock_state();
        loop {
            if state.shutting_down {
                drop(state);
                warn!("enqueue rejected: queue is shutting down");
                self.observer
                    .observe(QueueEvent::Rejected(RejectReason::ShuttingDown));
                return Err(EnqueueError::ShuttingDown(item));
            }
            if state.pending.len() < self.capacity {
                break;
            }
            state = match deadline {
                None => self.space.wait(state).expect("queue mutex poisoned"),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        drop(state);
                        warn!(capacity = self.capacity, "enqueue rejected: buffer full");
                        self.observer.observe(QueueEvent::Rejected(RejectReason::Full));
                        return Err(EnqueueError::Full(item));
                    }
                    let (guard, _) = self
                        .space
                        .wait_timeout(state, deadline - now)
                        .expect("queue mutex poisoned");
                    guard
                }
            };
        }

        state.pending.push_back(item);
        let pending = state.pending.len();
        drop(state);

        // The permit must only become visible once the item is in the
        // buffer; posting after the lock is released preserves that order.
        self.ready.post();
        debug!(pending, "item accepted");
        self.observer.observe(QueueEvent::Accepted);
        Ok(())
    }

    /// Requests shutdown.
    ///
    /// Idempotent: the first call sets the flag, wakes every producer
    /// parked on a full buffer (they observe the flag and reject), and
    /// posts the consumer wake signal exactly once so a sleeping consumer
    /// is guaranteed to observe the shutdown state. Later calls do nothing
    /// and never post a second wake, so the consumer cannot observe two
    /// terminal exits.
    pub fn shutdown(&self) {
        let mut state = self.lock_state();
        if state.shutting_down {
            debug!("shutdown already requested, ignoring");
            return;
        }
        state.shutting_down = true;
        let pending = state.pending.len();
        drop(state);

        self.space.notify_all();
        self.ready.post();
        info!(pending, "shutdown requested");
        self.observer.observe(QueueEvent::ShutdownRequested);
    }

    /// Waits for the next wake signal and resolves it to either the oldest
    /// pending item or the shutdown notice.
    ///
    /// Must only be called from the single consumer context, never
    /// concurrently with itself. The pop-or-stop decision is one atomic
    /// transition under the buffer lock; no caller work happens while the
    /// lock is held, so producers are only ever blocked by capacity, never
    /// by processing time.
    ///
    /// Pending items are always drained before the shutdown notice is
    /// delivered: the notice only surfaces once the buffer is empty.
    ///
    /// # Errors
    ///
    /// [`SignalError`] if a permit was available but the buffer was empty
    /// and shutdown had not been requested. Fatal; do not retry.
    pub fn wait_and_take(&self) -> Result<Taken<T>, SignalError> {
        self.ready.wait();

        let mut state = self.lock_state();
        if let Some(item) = state.pending.pop_front() {
            let pending = state.pending.len();
            drop(state);
            // One slot freed. Wake every parked producer: a single notify
            // could be swallowed by a producer that is concurrently timing
            // out, and admission is re-checked under the lock anyway.
            self.space.notify_all();
            debug!(pending, "item taken");
            self.observer.observe(QueueEvent::Taken);
            Ok(Taken::Item(item))
        } else if state.shutting_down {
            drop(state);
            info!("shutdown observed");
            self.observer.observe(QueueEvent::ShutdownObserved);
            Ok(Taken::Shutdown)
        } else {
            drop(state);
            error!("wake signal with no pending item and no shutdown request");
            Err(SignalError)
        }
    }

    /// Consumer loop: waits, takes, and hands each item to `process` until
    /// the shutdown notice arrives. Returns the number of items processed.
    ///
    /// `process` runs with no lock held.
    ///
    /// # Errors
    ///
    /// Propagates [`SignalError`] from [`Self::wait_and_take`].
    pub fn run(&self, mut process: impl FnMut(T)) -> Result<u64, SignalError> {
        let mut processed = 0u64;
        loop {
            match self.wait_and_take()? {
                Taken::Item(item) => {
                    process(item);
                    processed += 1;
                    self.observer.observe(QueueEvent::Processed);
                }
                Taken::Shutdown => return Ok(processed),
            }
        }
    }
}
