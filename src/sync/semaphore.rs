//! Counting semaphore built from a mutex and a condition variable.
//!
//! The standard library has no semaphore, so this is the classic
//! construction: a permit counter behind a [`Mutex`], and a [`Condvar`]
//! that waiters park on while the counter is zero. Waiting and taking a
//! permit are one atomic pairing: a waiter never consumes a permit it did
//! not wait for, and a posted permit admits exactly one waiter.

use std::sync::{Condvar, Mutex};

/// A counting signal: `post` makes a permit available, `wait` blocks until
/// one is, then takes it.
pub struct Semaphore {
    permits: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with `permits` initially available.
    #[must_use]
    pub fn new(permits: usize) -> Self {
        Self {
            permits: Mutex::new(permits),
            available: Condvar::new(),
        }
    }

    /// Makes one more permit available, waking a single waiter if any.
    pub fn post(&self) {
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        *permits += 1;
        self.available.notify_one();
    }

    /// Blocks until a permit is available, then takes it.
    ///
    /// The loop re-checks the counter after every wakeup, so spurious
    /// condvar wakeups never consume a permit.
    pub fn wait(&self) {
        let mut permits = self.permits.lock().expect("semaphore mutex poisoned");
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .expect("semaphore mutex poisoned");
        }
        *permits -= 1;
    }

    /// Number of permits currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        *self.permits.lock().expect("semaphore mutex poisoned")
    }
}
