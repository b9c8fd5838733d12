use std::sync::atomic::{AtomicU64, Ordering};

/// Per-process runtime counters.
///
/// All counters use `Relaxed` ordering — they are independent observations;
/// no cross-variable synchronisation is required.
///
/// Share via `Arc<Metrics>`; the runtime increments, the shutdown path logs
/// the summary.
#[derive(Default)]
pub struct Metrics {
    /// Total deliveries received since startup.
    pub received: AtomicU64,

    /// Deliveries acknowledged (work done or already done).
    pub acked: AtomicU64,

    /// Deliveries rejected (decode failure, missing input, execution failure).
    pub rejected: AtomicU64,

    /// Acknowledged deliveries where the idempotency check skipped the work.
    /// Subset of `acked`.
    pub already_done: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_acked(&self) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_already_done(&self) {
        self.already_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Log a one-line summary. Called once on shutdown.
    pub fn log_summary(&self) {
        tracing::info!(
            received = self.received.load(Ordering::Relaxed),
            acked = self.acked.load(Ordering::Relaxed),
            rejected = self.rejected.load(Ordering::Relaxed),
            already_done = self.already_done.load(Ordering::Relaxed),
            "📊 session summary"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment_independently() {
        let metrics = Metrics::new();
        metrics.inc_received();
        metrics.inc_received();
        metrics.inc_acked();
        metrics.inc_already_done();
        metrics.inc_rejected();

        assert_eq!(metrics.received.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.acked.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.already_done.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.rejected.load(Ordering::Relaxed), 1);
    }
}
