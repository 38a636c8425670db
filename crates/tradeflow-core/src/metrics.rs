//! Global atomic counters for TradeFlow observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a run).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters, no allocations, no locking.
pub struct Metrics {
    shipments_processed: AtomicU64,
    stages_executed: AtomicU64,
    stage_failures: AtomicU64,
    events_emitted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            shipments_processed: AtomicU64::new(0),
            stages_executed: AtomicU64::new(0),
            stage_failures: AtomicU64::new(0),
            events_emitted: AtomicU64::new(0),
        }
    }

    /// Increment the shipments-processed counter by one.
    pub fn inc_shipments_processed(&self) {
        self.shipments_processed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "shipments_processed", "counter incremented");
    }

    /// Increment the stages-executed counter by one.
    pub fn inc_stages_executed(&self) {
        self.stages_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stages_executed", "counter incremented");
    }

    /// Increment the stage-failures counter by one.
    pub fn inc_stage_failures(&self) {
        self.stage_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "stage_failures", "counter incremented");
    }

    pub fn inc_events_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            shipments_processed = self.shipments_processed(),
            stages_executed = self.stages_executed(),
            stage_failures = self.stage_failures(),
            events_emitted = self.events_emitted(),
        );
    }

    pub fn shipments_processed(&self) -> u64 {
        self.shipments_processed.load(Ordering::Relaxed)
    }

    pub fn stages_executed(&self) -> u64 {
        self.stages_executed.load(Ordering::Relaxed)
    }

    pub fn stage_failures(&self) -> u64 {
        self.stage_failures.load(Ordering::Relaxed)
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.shipments_processed.store(0, Ordering::Relaxed);
        self.stages_executed.store(0, Ordering::Relaxed);
        self.stage_failures.store(0, Ordering::Relaxed);
        self.events_emitted.store(0, Ordering::Relaxed);
    }
}
