//! Rate-limited error logging
//!
//! A route writing to a full or read-only disk fails once per record. This
//! logger emits at most one line per interval and reports how many failures
//! were folded into it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use civic_sinks::util::RateLimitedLogger;
//!
//! let logger = RateLimitedLogger::new("vix_latest", Duration::from_secs(10));
//! let err = std::io::Error::other("disk full");
//! for _ in 0..100 {
//!     logger.error("record write failed", &err);
//! }
//! assert_eq!(logger.total_error_count(), 100);
//! ```

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between log lines
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Logs errors for one route at a bounded rate
#[derive(Debug)]
pub struct RateLimitedLogger {
    /// Route name attached to every line
    label: String,

    min_interval: Duration,

    last_log_time: Mutex<Option<Instant>>,

    /// Errors since the last emitted line
    error_count: AtomicU64,

    total_errors: AtomicU64,
}

impl RateLimitedLogger {
    /// Create a logger for `label` with the given interval
    pub fn new(label: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            label: label.into(),
            min_interval,
            last_log_time: Mutex::new(None),
            error_count: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
        }
    }

    /// Create a logger with [`DEFAULT_LOG_INTERVAL`]
    pub fn with_default_interval(label: impl Into<String>) -> Self {
        Self::new(label, DEFAULT_LOG_INTERVAL)
    }

    /// Label attached to log lines
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Record an error, logging it if the interval has elapsed
    ///
    /// Returns true if a line was emitted.
    pub fn error(&self, message: &str, error: &dyn Display) -> bool {
        self.error_count.fetch_add(1, Ordering::Relaxed);
        let total = self.total_errors.fetch_add(1, Ordering::Relaxed) + 1;

        if !self.should_log() {
            return false;
        }

        let count = self.error_count.swap(0, Ordering::Relaxed);
        if count > 1 {
            tracing::error!(
                route = %self.label,
                error = %error,
                suppressed_count = count - 1,
                total_errors = total,
                "{message} (rate-limited)"
            );
        } else {
            tracing::error!(
                route = %self.label,
                error = %error,
                total_errors = total,
                "{message}"
            );
        }
        true
    }

    fn should_log(&self) -> bool {
        let mut last = self.last_log_time.lock();
        let now = Instant::now();
        match *last {
            Some(at) if now.duration_since(at) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Errors recorded since the last emitted line
    pub fn pending_error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Errors recorded in total
    pub fn total_error_count(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}
