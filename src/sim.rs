//! Consultation-hour simulation: the driver scaffolding around the queue.
//!
//! One producer thread per student, each submitting a single consultation
//! request after a jittered arrival delay, while a single consumer works
//! through the waiting queue with a simulated per-item consultation time.
//! Shutdown is requested only after every producer thread has been joined,
//! so the queue's "no enqueues after shutdown" precondition holds
//! structurally rather than by timing.
//!
//! All delays live in [`SimConfig`] and can be zeroed for deterministic
//! runs; see [`SimConfig::fast`].

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::Rng;

use crate::consumer::{Consumer, ConsumerError};
use crate::queue::{RendezvousQueue, Timeout};
use crate::trace::{info, warn};

/// A student's consultation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsultRequest {
    /// Student identifier, 1-based.
    pub student: u32,
    /// What the student wants to talk about.
    pub topic: String,
}

impl ConsultRequest {
    fn new(student: u32) -> Self {
        Self {
            student,
            topic: format!("research topic {student}"),
        }
    }
}

/// Simulation parameters.
///
/// The defaults mirror the classic classroom setup: ten students, five
/// waiting-room seats, half a second of patience at the door.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of producer threads to spawn.
    pub students: u32,
    /// Waiting-queue capacity.
    pub capacity: usize,
    /// How long a student waits for a seat before giving up.
    pub enqueue_timeout: Duration,
    /// Uniform range of delays between student arrivals.
    pub arrival_interval: Range<Duration>,
    /// Uniform range of per-item consultation times.
    pub consult_time: Range<Duration>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            students: 10,
            capacity: 5,
            enqueue_timeout: Duration::from_millis(500),
            arrival_interval: Duration::from_millis(50)..Duration::from_millis(200),
            consult_time: Duration::from_millis(300)..Duration::from_millis(800),
        }
    }
}

impl SimConfig {
    /// Zero-delay variant with a generous admission timeout, for tests and
    /// quick demo runs.
    #[must_use]
    pub fn fast(students: u32, capacity: usize) -> Self {
        Self {
            students,
            capacity,
            enqueue_timeout: Duration::from_secs(5),
            arrival_interval: Duration::ZERO..Duration::ZERO,
            consult_time: Duration::ZERO..Duration::ZERO,
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimReport {
    /// Requests admitted to the waiting queue.
    pub accepted: u64,
    /// Requests turned away.
    pub rejected: u64,
    /// Requests the consumer finished processing.
    pub attended: u64,
}

/// Samples a delay from `range`; degenerate ranges yield their start.
fn jitter(range: &Range<Duration>) -> Duration {
    if range.start >= range.end {
        range.start
    } else {
        rand::thread_rng().gen_range(range.clone())
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Runs a full simulation: spawn the consumer, stagger producer arrivals,
/// join every producer, request shutdown, join the consumer.
///
/// # Errors
///
/// Propagates [`ConsumerError`] if the consumer loop died; producer-side
/// rejections are counted in the report, never escalated.
///
/// # Panics
///
/// Panics if the OS refuses to spawn a thread.
pub fn run(config: &SimConfig) -> Result<SimReport, ConsumerError> {
    let queue = Arc::new(RendezvousQueue::new(config.capacity));
    let accepted = Arc::new(AtomicU64::new(0));
    let rejected = Arc::new(AtomicU64::new(0));

    let consult_time = config.consult_time.clone();
    let consumer = Consumer::spawn(Arc::clone(&queue), move |request: ConsultRequest| {
        info!(
            student = request.student,
            topic = %request.topic,
            "consultation started"
        );
        pause(jitter(&consult_time));
        info!(student = request.student, "consultation finished");
    });

    let mut producers = Vec::with_capacity(config.students as usize);
    for student in 1..=config.students {
        let queue = Arc::clone(&queue);
        let accepted = Arc::clone(&accepted);
        let rejected = Arc::clone(&rejected);
        let timeout = config.enqueue_timeout;

        let handle = thread::Builder::new()
            .name(format!("student-{student}"))
            .spawn(move || {
                let request = ConsultRequest::new(student);
                match queue.enqueue(request, Timeout::Duration(timeout)) {
                    Ok(()) => {
                        info!(student, "joined the waiting queue");
                        accepted.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(err) => {
                        warn!(student, reason = ?err.reason(), "turned away");
                        rejected.fetch_add(1, Ordering::Relaxed);
                    }
                }
            })
            .expect("failed to spawn student thread");
        producers.push(handle);

        pause(jitter(&config.arrival_interval));
    }

    for handle in producers {
        let _ = handle.join();
    }

    // Every producer is done; the drain set is now fixed.
    queue.shutdown();
    let attended = consumer.join()?;

    Ok(SimReport {
        accepted: accepted.load(Ordering::Relaxed),
        rejected: rejected.load(Ordering::Relaxed),
        attended,
    })
}
