//! Success/failure accounting with a once-per-second rate line.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Serialize;
use tracing::info;

/// Final counts for the run summary.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MonitorState {
    /// Lookups that matched an alias.
    pub successes: u64,
    /// Lookups with no covering alias.
    pub failures: u64,
}

/// Shared lookup counters. Workers bump them; a ticker thread logs the
/// processing rate once per second until [`Monitor::stop`].
#[derive(Default)]
pub struct Monitor {
    successes: AtomicU64,
    failures: AtomicU64,
    stopped: AtomicBool,
}

impl Monitor {
    /// Fresh counters, no ticker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an aliased lookup.
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a no-match lookup.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Aliased lookups so far.
    pub fn successes(&self) -> u64 {
        self.successes.load(Ordering::Relaxed)
    }

    /// No-match lookups so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Snapshot for the run summary.
    pub fn state(&self) -> MonitorState {
        MonitorState {
            successes: self.successes(),
            failures: self.failures(),
        }
    }

    /// Ask the ticker thread to exit after its next wakeup.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    /// Spawn the rate-logging ticker on a clone of the shared counters.
    /// Join the handle after [`Monitor::stop`] to flush the last line.
    pub fn spawn_ticker(monitor: Arc<Self>) -> JoinHandle<()> {
        std::thread::spawn(move || {
            let mut ticks = 0u64;
            let mut last_total = 0u64;
            while !monitor.stopped.load(Ordering::Relaxed) {
                std::thread::sleep(Duration::from_secs(1));
                ticks += 1;
                let successes = monitor.successes();
                let failures = monitor.failures();
                let total = successes + failures;
                info!(
                    total,
                    rate = total as f64 / ticks as f64,
                    delta = total - last_total,
                    aliased = successes,
                    no_match = failures,
                    "lookup throughput"
                );
                last_total = total;
            }
        })
    }
}
