//! crates/logging/src/stats.rs

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by producers, the drain loop and the controller.
#[derive(Debug, Default)]
pub(crate) struct Stats {
    written: AtomicU64,
    dropped: AtomicU64,
    local_inits: AtomicU64,
    drain_starts: AtomicU64,
}

impl Stats {
    pub(crate) fn record_written(&self) {
        self.written.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_local_init(&self) {
        self.local_inits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_drain_start(&self) {
        self.drain_starts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            written: self.written.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            local_inits: self.local_inits.load(Ordering::Relaxed),
            drain_starts: self.drain_starts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a logger's counters.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatsSnapshot {
    /// Lines handed to the output target.
    pub written: u64,
    /// Records discarded by a full queue.
    pub dropped: u64,
    /// Times the synchronous writer was initialized.
    pub local_inits: u64,
    /// Times a drain loop was started.
    pub drain_starts: u64,
}
