// Poll loop counters: sent, applied, failed and stale ticks.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStatsSnapshot {
    pub loops_started: u64,
    pub ticks_sent: u64,
    pub snapshots_applied: u64,
    /// Ticks answered with a non-success status.
    pub ticks_skipped: u64,
    /// Transport failures and malformed bodies.
    pub tick_errors: u64,
    /// Responses that arrived after their loop was cancelled or replaced.
    pub stale_discarded: u64,
}

#[derive(Default)]
pub struct PollStats {
    loops_started: AtomicU64,
    ticks_sent: AtomicU64,
    snapshots_applied: AtomicU64,
    ticks_skipped: AtomicU64,
    tick_errors: AtomicU64,
    stale_discarded: AtomicU64,
}

impl PollStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_loop_started(&self) {
        self.loops_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick_sent(&self) {
        self.ticks_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_applied(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.ticks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.tick_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PollStatsSnapshot {
        PollStatsSnapshot {
            loops_started: self.loops_started.load(Ordering::Relaxed),
            ticks_sent: self.ticks_sent.load(Ordering::Relaxed),
            snapshots_applied: self.snapshots_applied.load(Ordering::Relaxed),
            ticks_skipped: self.ticks_skipped.load(Ordering::Relaxed),
            tick_errors: self.tick_errors.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
        }
    }
}
