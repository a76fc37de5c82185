//! Structured logging for the queue, its consumer, and the simulation.
//!
//! Gated behind the `tracing` cargo feature (on by default). With the
//! feature disabled every macro below compiles to nothing, so embeddings
//! that bring their own telemetry pay no logging overhead.

/// Installs the global tracing subscriber.
///
/// Call once, at the start of the binary or a test run. The filter honors
/// `RUST_LOG` and defaults to `lectern=info`. Does nothing when the
/// `tracing` feature is disabled.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lectern=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_timer(fmt::time::uptime())
        .init();
}

#[cfg(not(feature = "tracing"))]
pub const fn init_tracing() {}

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, error, info, warn};

// Without the feature, every log macro swallows its arguments.
#[cfg(not(feature = "tracing"))]
macro_rules! noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
pub(crate) use noop as debug;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop as error;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop as info;
#[cfg(not(feature = "tracing"))]
pub(crate) use noop as warn;
