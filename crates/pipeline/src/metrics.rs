//! Router metrics
//!
//! Atomic counters with relaxed ordering. Values are eventually consistent.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the bus router
#[derive(Debug, Default)]
pub struct RouterMetrics {
    /// Envelopes published
    envelopes_received: AtomicU64,

    /// Envelopes delivered to at least one filer
    envelopes_routed: AtomicU64,

    /// Envelopes with no subscriber, or refused by every subscriber
    envelopes_dropped: AtomicU64,

    filer_sends_success: AtomicU64,

    /// Sends refused (full or closed channel)
    filer_sends_failed: AtomicU64,

    /// Times a filer channel was full
    backpressure_events: AtomicU64,

    /// Sum of records carried by published envelopes
    records_processed: AtomicU64,
}

impl RouterMetrics {
    /// Create zeroed counters
    #[inline]
    pub const fn new() -> Self {
        Self {
            envelopes_received: AtomicU64::new(0),
            envelopes_routed: AtomicU64::new(0),
            envelopes_dropped: AtomicU64::new(0),
            filer_sends_success: AtomicU64::new(0),
            filer_sends_failed: AtomicU64::new(0),
            backpressure_events: AtomicU64::new(0),
            records_processed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self, record_count: u64) {
        self.envelopes_received.fetch_add(1, Ordering::Relaxed);
        self.records_processed
            .fetch_add(record_count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_routed(&self) {
        self.envelopes_routed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.envelopes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_send_success(&self) {
        self.filer_sends_success.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_send_failed(&self) {
        self.filer_sends_failed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure(&self) {
        self.backpressure_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            envelopes_received: self.envelopes_received.load(Ordering::Relaxed),
            envelopes_routed: self.envelopes_routed.load(Ordering::Relaxed),
            envelopes_dropped: self.envelopes_dropped.load(Ordering::Relaxed),
            filer_sends_success: self.filer_sends_success.load(Ordering::Relaxed),
            filer_sends_failed: self.filer_sends_failed.load(Ordering::Relaxed),
            backpressure_events: self.backpressure_events.load(Ordering::Relaxed),
            records_processed: self.records_processed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RouterMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub envelopes_received: u64,
    pub envelopes_routed: u64,
    pub envelopes_dropped: u64,
    pub filer_sends_success: u64,
    pub filer_sends_failed: u64,
    pub backpressure_events: u64,
    pub records_processed: u64,
}

// ============================================================================
// Backpressure Tracker
// ============================================================================

/// Aggregates backpressure drops into at most one log line per second
pub struct BackpressureTracker {
    interval_drops: AtomicU64,
    interval_records: AtomicU64,
    /// Epoch milliseconds of the last line
    last_log_ms: AtomicU64,
}

const LOG_INTERVAL_MS: u64 = 1000;

/// Drops per interval above which the line is logged at error level
const CRITICAL_DROP_THRESHOLD: u64 = 100;

impl BackpressureTracker {
    pub fn new() -> Self {
        Self {
            interval_drops: AtomicU64::new(0),
            interval_records: AtomicU64::new(0),
            last_log_ms: AtomicU64::new(Self::now_ms()),
        }
    }

    /// Record one refused send; returns true if a line was emitted
    pub fn record_drop(&self, record_count: u64) -> bool {
        self.interval_drops.fetch_add(1, Ordering::Relaxed);
        self.interval_records
            .fetch_add(record_count, Ordering::Relaxed);
        self.maybe_log()
    }

    fn maybe_log(&self) -> bool {
        let now = Self::now_ms();
        let last = self.last_log_ms.load(Ordering::Relaxed);

        if now.saturating_sub(last) < LOG_INTERVAL_MS {
            return false;
        }
        if self
            .last_log_ms
            .compare_exchange(last, now, Ordering::SeqCst, Ordering::Relaxed)
            .is_err()
        {
            return false;
        }

        let drops = self.interval_drops.swap(0, Ordering::Relaxed);
        let records = self.interval_records.swap(0, Ordering::Relaxed);
        if drops == 0 {
            return false;
        }

        if drops > CRITICAL_DROP_THRESHOLD {
            tracing::error!(
                dropped_envelopes = drops,
                dropped_records = records,
                threshold = CRITICAL_DROP_THRESHOLD,
                "high backpressure, filers cannot keep up"
            );
        } else {
            tracing::warn!(
                dropped_envelopes = drops,
                dropped_records = records,
                "backpressure: envelopes dropped in last second"
            );
        }
        true
    }

    #[inline]
    fn now_ms() -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    #[cfg(test)]
    pub fn current_drops(&self) -> u64 {
        self.interval_drops.load(Ordering::Relaxed)
    }
}

impl Default for BackpressureTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BackpressureTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackpressureTracker")
            .field("interval_drops", &self.interval_drops.load(Ordering::Relaxed))
            .finish()
    }
}
