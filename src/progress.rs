//! Cancellation and progress reporting, threaded through the orchestrator
//! and drivers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag, shared via `Arc` between a driver and
/// every scan it starts. Polled, never used to abort an in-flight OS read.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Atomic byte counter; drivers/CLIs may sample it periodically to report
/// progress. Cheap enough to bump on every buffer without contention
/// concerns, since it's a single relaxed add.
#[derive(Clone, Default)]
pub struct ProgressReporter(Arc<AtomicU64>);

impl ProgressReporter {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU64::new(0)))
    }

    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(bytes_scanned = self.bytes_scanned(), "progress");
    }

    pub fn bytes_scanned(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_token_shares_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn progress_reporter_accumulates() {
        let p = ProgressReporter::new();
        p.add(10);
        p.add(5);
        assert_eq!(p.bytes_scanned(), 15);
    }
}
