//! Filer counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one route
#[derive(Debug, Default)]
pub struct FilerMetrics {
    /// Messages handed to the filer
    pub messages_received: AtomicU64,

    /// Messages rejected by the route predicate
    pub messages_filtered: AtomicU64,

    /// Records successfully written
    pub records_stored: AtomicU64,

    /// Records whose write failed
    pub write_errors: AtomicU64,
}

impl FilerMetrics {
    /// Create zeroed counters
    pub const fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_filtered: AtomicU64::new(0),
            records_stored: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_filtered(&self) {
        self.messages_filtered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stored(&self) {
        self.records_stored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self) {
        self.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> FilerSnapshot {
        FilerSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_filtered: self.messages_filtered.load(Ordering::Relaxed),
            records_stored: self.records_stored.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`FilerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilerSnapshot {
    pub messages_received: u64,
    pub messages_filtered: u64,
    pub records_stored: u64,
    pub write_errors: u64,
}
