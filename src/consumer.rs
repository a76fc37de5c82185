//! Consumer thread runtime.
//!
//! Wraps the queue's consumer loop in a named OS thread and hands back a
//! join handle, so the owning caller can request shutdown on the queue and
//! then wait for the loop to drain and exit.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::queue::{RendezvousQueue, SignalError};
use crate::trace::info;

/// Error from a finished consumer.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// The wake-signal accounting was violated; see [`SignalError`].
    #[error(transparent)]
    Accounting(#[from] SignalError),
    /// The processing callback panicked.
    #[error("consumer thread panicked")]
    Panicked,
}

/// Handle to the single consumer thread.
///
/// Exactly one consumer drives a queue; spawning a second one for the same
/// queue violates [`RendezvousQueue::wait_and_take`]'s contract.
pub struct Consumer {
    handle: JoinHandle<Result<u64, SignalError>>,
}

impl Consumer {
    /// Spawns the consumer thread.
    ///
    /// `process` receives every accepted item in FIFO order, with no lock
    /// held. The thread exits once it observes the queue's shutdown notice.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to spawn the thread.
    pub fn spawn<T, F>(queue: Arc<RendezvousQueue<T>>, process: F) -> Self
    where
        T: Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("consumer".into())
            .spawn(move || {
                info!("consumer thread started");
                let result = queue.run(process);
                info!("consumer thread exiting");
                result
            })
            .expect("failed to spawn consumer thread");

        Self { handle }
    }

    /// Waits for the consumer to exit and returns how many items it
    /// processed.
    ///
    /// # Errors
    ///
    /// - [`ConsumerError::Accounting`] if the loop stopped on a
    ///   wake-signal accounting violation.
    /// - [`ConsumerError::Panicked`] if the processing callback panicked.
    pub fn join(self) -> Result<u64, ConsumerError> {
        match self.handle.join() {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConsumerError::Panicked),
        }
    }
}
