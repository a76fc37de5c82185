//! End-to-end tests for the rendezvous queue protocol.
//!
//! These exercise the full producer/consumer lifecycle across real OS
//! threads: admission under contention, FIFO drain order, the shutdown
//! handshake, and the simulation driver.
//!
//! # Running with tracing
//!
//! To see the queue's log output, run with no capture:
//! ```bash
//! RUST_LOG=lectern=debug cargo test -- --nocapture
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex, Once};
use std::thread;
use std::time::Duration;

use lectern::sim::{self, SimConfig};
use lectern::{
    Consumer, EnqueueError, EventLog, Observer, QueueEvent, RejectReason, RendezvousQueue, Taken,
    Timeout,
};

static INIT_TRACING: Once = Once::new();

/// Initialize tracing for tests (only once).
fn init_test_tracing() {
    INIT_TRACING.call_once(lectern::init_tracing);
}

#[test]
fn capacity_never_exceeded_under_contention() {
    init_test_tracing();

    let queue = Arc::new(RendezvousQueue::new(5));
    let max_pending = Arc::new(AtomicUsize::new(0));
    let done = Arc::new(AtomicBool::new(false));

    // Sample the buffer depth while producers and the consumer race.
    let sampler = {
        let queue = Arc::clone(&queue);
        let max_pending = Arc::clone(&max_pending);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                max_pending.fetch_max(queue.len(), Ordering::Relaxed);
                thread::yield_now();
            }
        })
    };

    let consumer = Consumer::spawn(Arc::clone(&queue), |_: u32| {
        // A sliver of processing time keeps the buffer under pressure.
        thread::sleep(Duration::from_micros(200));
    });

    let barrier = Arc::new(Barrier::new(10));
    let producers: Vec<_> = (0..10u32)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..20 {
                    queue.enqueue(p * 100 + i, Timeout::Infinite).unwrap();
                }
            })
        })
        .collect();

    for handle in producers {
        handle.join().unwrap();
    }
    queue.shutdown();
    assert_eq!(consumer.join().unwrap(), 200);

    done.store(true, Ordering::Release);
    sampler.join().unwrap();

    assert!(
        max_pending.load(Ordering::Relaxed) <= 5,
        "buffer exceeded its capacity"
    );
}

#[test]
fn fast_burst_fills_to_capacity_then_rejects() {
    // Ten producers race with zero patience and nobody draining: exactly
    // five seats are won, the rest are turned away at the door.
    let queue = Arc::new(RendezvousQueue::new(5));
    let barrier = Arc::new(Barrier::new(10));

    let producers: Vec<_> = (0..10u32)
        .map(|p| {
            let queue = Arc::clone(&queue);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                queue.enqueue(p, Timeout::Duration(Duration::ZERO)).is_ok()
            })
        })
        .collect();

    let accepted = producers
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();
    assert_eq!(accepted, 5);
    assert_eq!(queue.len(), 5);

    // Every winner is attended exactly once.
    queue.shutdown();
    let consumer = Consumer::spawn(Arc::clone(&queue), |_: u32| {});
    assert_eq!(consumer.join().unwrap(), 5);
}

#[test]
fn fifo_order_is_preserved() {
    let queue = Arc::new(RendezvousQueue::new(5));
    let seen = Arc::new(Mutex::new(Vec::new()));

    let consumer = {
        let seen = Arc::clone(&seen);
        Consumer::spawn(Arc::clone(&queue), move |i: u32| {
            seen.lock().unwrap().push(i);
        })
    };

    for i in 0..20 {
        queue.enqueue(i, Timeout::Infinite).unwrap();
    }
    queue.shutdown();
    consumer.join().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, (0..20).collect::<Vec<_>>());
}

#[test]
fn no_wakeup_is_lost_across_producers() {
    let queue = Arc::new(RendezvousQueue::new(5));
    let attended = Arc::new(AtomicU64::new(0));

    let consumer = {
        let attended = Arc::clone(&attended);
        Consumer::spawn(Arc::clone(&queue), move |_: u32| {
            attended.fetch_add(1, Ordering::Relaxed);
        })
    };

    let producers: Vec<_> = (0..4u32)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..25 {
                    queue.enqueue(p * 1000 + i, Timeout::Infinite).unwrap();
                }
            })
        })
        .collect();

    for handle in producers {
        handle.join().unwrap();
    }
    queue.shutdown();

    // Exactly one non-shutdown take per accepted item.
    assert_eq!(consumer.join().unwrap(), 100);
    assert_eq!(attended.load(Ordering::Relaxed), 100);
}

#[test]
fn capacity_one_race_admits_one_then_the_other() {
    let queue = Arc::new(RendezvousQueue::new(1));

    queue.enqueue("first", Timeout::Infinite).unwrap();

    let finished = Arc::new(AtomicBool::new(false));
    let loser = {
        let queue = Arc::clone(&queue);
        let finished = Arc::clone(&finished);
        thread::spawn(move || {
            let result = queue.enqueue("second", Timeout::Infinite);
            finished.store(true, Ordering::Release);
            result
        })
    };

    // The loser stays parked while the seat is occupied.
    thread::sleep(Duration::from_millis(30));
    assert!(!finished.load(Ordering::Acquire));
    assert_eq!(queue.len(), 1);

    // Draining the head admits the parked producer.
    assert_eq!(queue.wait_and_take(), Ok(Taken::Item("first")));
    assert_eq!(queue.wait_and_take(), Ok(Taken::Item("second")));
    loser.join().unwrap().unwrap();

    queue.shutdown();
    assert_eq!(queue.wait_and_take(), Ok(Taken::Shutdown));
}

#[test]
fn shutdown_with_no_items_exits_immediately() {
    let log = Arc::new(EventLog::new());
    let queue: Arc<RendezvousQueue<u32>> =
        Arc::new(RendezvousQueue::with_observer(5, Arc::clone(&log) as Arc<dyn Observer>));

    let consumer = Consumer::spawn(Arc::clone(&queue), |_| {});
    queue.shutdown();

    assert_eq!(consumer.join().unwrap(), 0);
    assert_eq!(log.count(QueueEvent::Processed), 0);
    assert_eq!(log.count(QueueEvent::ShutdownObserved), 1);
}

#[test]
fn concurrent_shutdowns_cause_a_single_exit() {
    let log = Arc::new(EventLog::new());
    let queue: Arc<RendezvousQueue<u32>> =
        Arc::new(RendezvousQueue::with_observer(2, Arc::clone(&log) as Arc<dyn Observer>));

    queue.enqueue(1, Timeout::Infinite).unwrap();
    queue.enqueue(2, Timeout::Infinite).unwrap();

    let callers: Vec<_> = (0..3)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || queue.shutdown())
        })
        .collect();
    for handle in callers {
        handle.join().unwrap();
    }

    let consumer = Consumer::spawn(Arc::clone(&queue), |_| {});
    assert_eq!(consumer.join().unwrap(), 2);

    assert_eq!(log.count(QueueEvent::ShutdownRequested), 1);
    assert_eq!(log.count(QueueEvent::ShutdownObserved), 1);
}

#[test]
fn rejected_enqueue_reports_reason_and_returns_item() {
    let queue = RendezvousQueue::new(1);
    queue.enqueue("seated", Timeout::Infinite).unwrap();

    let err = queue
        .enqueue("late", Timeout::Duration(Duration::from_millis(5)))
        .unwrap_err();
    assert_eq!(err.reason(), RejectReason::Full);
    assert_eq!(err.into_item(), "late");

    queue.shutdown();
    let err = queue.enqueue("after-hours", Timeout::Infinite).unwrap_err();
    assert!(matches!(err, EnqueueError::ShuttingDown("after-hours")));
}

#[test]
fn observer_accounts_for_every_item() {
    let log = Arc::new(EventLog::new());
    let queue: Arc<RendezvousQueue<u32>> =
        Arc::new(RendezvousQueue::with_observer(3, Arc::clone(&log) as Arc<dyn Observer>));

    let consumer = Consumer::spawn(Arc::clone(&queue), |_| {});

    let producers: Vec<_> = (0..2u32)
        .map(|p| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..10 {
                    queue.enqueue(p * 10 + i, Timeout::Infinite).unwrap();
                }
            })
        })
        .collect();
    for handle in producers {
        handle.join().unwrap();
    }
    queue.shutdown();
    consumer.join().unwrap();

    assert_eq!(log.count(QueueEvent::Accepted), 20);
    assert_eq!(log.count(QueueEvent::Taken), 20);
    assert_eq!(log.count(QueueEvent::Processed), 20);
    assert_eq!(log.count(QueueEvent::ShutdownObserved), 1);
}

#[test]
fn simulation_attends_every_accepted_request() {
    init_test_tracing();

    let report = sim::run(&SimConfig::fast(10, 5)).unwrap();
    assert_eq!(report.accepted + report.rejected, 10);
    assert_eq!(report.attended, report.accepted);

    // With a generous admission timeout nobody is turned away.
    assert_eq!(report.rejected, 0);
}
