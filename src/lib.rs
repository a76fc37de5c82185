//! Bounded rendezvous queue between many concurrent producers and a single
//! consumer, with graceful, signal-driven shutdown.
//!
//! # Architecture
//!
//! - [`queue::RendezvousQueue`] - bounded FIFO buffer, counting wake
//!   signal, and one-shot shutdown flag; the whole synchronization protocol
//!   lives here.
//! - [`consumer::Consumer`] - the single consumer thread and its join
//!   handle.
//! - [`observer`] - run-scoped event observation for deterministic tests.
//! - [`sync`] - the counting semaphore backing the wake signal.
//! - [`sim`] - the demo driver: staggered producers, a consumer with
//!   simulated thinking time, and a final report.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lectern::{Consumer, RendezvousQueue, Timeout};
//!
//! let queue = Arc::new(RendezvousQueue::new(5));
//! let consumer = Consumer::spawn(Arc::clone(&queue), |n: u32| {
//!     println!("got {n}");
//! });
//!
//! queue.enqueue(1, Timeout::Infinite).unwrap();
//! queue.enqueue(2, Timeout::Infinite).unwrap();
//! queue.shutdown();
//!
//! assert_eq!(consumer.join().unwrap(), 2);
//! ```

pub mod consumer;
pub mod observer;
pub mod queue;
pub mod sim;
pub mod sync;

mod trace;

pub use consumer::{Consumer, ConsumerError};
pub use observer::{EventLog, NullObserver, Observer, QueueEvent, RejectReason};
pub use queue::{EnqueueError, RendezvousQueue, SignalError, Taken, Timeout};
pub use trace::init_tracing;
