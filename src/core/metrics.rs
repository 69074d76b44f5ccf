//! Shipper metrics for observability
//!
//! Overflow drops and failed pushes are otherwise silent, so these counters
//! are the only way to see how much log data never reached the endpoint.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Callback type for overflow notifications
///
/// Called when entries are dropped because the queue is full.
/// The parameter is the total count of overflow drops so far.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Internal-health counters for one shipper
///
/// # Example
///
/// ```
/// use loki_shipper::ShipperMetrics;
///
/// let metrics = ShipperMetrics::new();
///
/// metrics.record_enqueued();
/// metrics.record_overflow();
///
/// assert_eq!(metrics.enqueued(), 1);
/// assert_eq!(metrics.dropped_overflow(), 1);
/// ```
#[derive(Debug)]
pub struct ShipperMetrics {
    /// Entries accepted into the queue
    enqueued: AtomicU64,

    /// Entries dropped because the queue was full
    dropped_overflow: AtomicU64,

    /// Entries refused because the shipper was closing or stopped
    rejected_closed: AtomicU64,

    /// Pushes answered with 2xx
    pushes_succeeded: AtomicU64,

    /// Pushes that failed (transport error or non-2xx)
    pushes_failed: AtomicU64,

    /// Entries contained in successful pushes
    entries_shipped: AtomicU64,

    /// Entries contained in failed pushes
    entries_discarded: AtomicU64,
}

impl ShipperMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            enqueued: AtomicU64::new(0),
            dropped_overflow: AtomicU64::new(0),
            rejected_closed: AtomicU64::new(0),
            pushes_succeeded: AtomicU64::new(0),
            pushes_failed: AtomicU64::new(0),
            entries_shipped: AtomicU64::new(0),
            entries_discarded: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_overflow(&self) -> u64 {
        self.dropped_overflow.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_closed(&self) -> u64 {
        self.rejected_closed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn pushes_succeeded(&self) -> u64 {
        self.pushes_succeeded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn pushes_failed(&self) -> u64 {
        self.pushes_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_shipped(&self) -> u64 {
        self.entries_shipped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_discarded(&self) -> u64 {
        self.entries_discarded.load(Ordering::Relaxed)
    }

    /// Record an accepted entry
    #[inline]
    pub fn record_enqueued(&self) -> u64 {
        self.enqueued.fetch_add(1, Ordering::Relaxed)
    }

    /// Record an overflow drop, returning the previous count
    #[inline]
    pub fn record_overflow(&self) -> u64 {
        self.dropped_overflow.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected_closed(&self) -> u64 {
        self.rejected_closed.fetch_add(1, Ordering::Relaxed)
    }

    /// Record a successful push of `entries` entries
    pub fn record_push_succeeded(&self, entries: usize) {
        self.pushes_succeeded.fetch_add(1, Ordering::Relaxed);
        self.entries_shipped
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    /// Record a failed push whose `entries` entries are now gone
    pub fn record_push_failed(&self, entries: usize) {
        self.pushes_failed.fetch_add(1, Ordering::Relaxed);
        self.entries_discarded
            .fetch_add(entries as u64, Ordering::Relaxed);
    }

    /// Total pushes attempted
    pub fn pushes(&self) -> u64 {
        self.pushes_succeeded() + self.pushes_failed()
    }

    /// Share of accepted-or-dropped entries that never reached the endpoint,
    /// as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been logged.
    pub fn drop_rate(&self) -> f64 {
        let lost = (self.dropped_overflow() + self.entries_discarded()) as f64;
        let total = self.enqueued() as f64 + self.dropped_overflow() as f64;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.enqueued.store(0, Ordering::Relaxed);
        self.dropped_overflow.store(0, Ordering::Relaxed);
        self.rejected_closed.store(0, Ordering::Relaxed);
        self.pushes_succeeded.store(0, Ordering::Relaxed);
        self.pushes_failed.store(0, Ordering::Relaxed);
        self.entries_shipped.store(0, Ordering::Relaxed);
        self.entries_discarded.store(0, Ordering::Relaxed);
    }
}

impl Default for ShipperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ShipperMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            enqueued: AtomicU64::new(self.enqueued()),
            dropped_overflow: AtomicU64::new(self.dropped_overflow()),
            rejected_closed: AtomicU64::new(self.rejected_closed()),
            pushes_succeeded: AtomicU64::new(self.pushes_succeeded()),
            pushes_failed: AtomicU64::new(self.pushes_failed()),
            entries_shipped: AtomicU64::new(self.entries_shipped()),
            entries_discarded: AtomicU64::new(self.entries_discarded()),
        }
    }
}
