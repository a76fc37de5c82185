//! Synchronization primitives for coordinating producers and the consumer.
//!
//! The queue's wake protocol needs a counting signal whose wait operation
//! blocks the calling thread until a permit is available, then takes it
//! atomically. [`semaphore::Semaphore`] provides exactly that.

pub mod semaphore;

pub use semaphore::Semaphore;
