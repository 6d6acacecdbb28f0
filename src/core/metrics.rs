//! Delivery counters for enabled log records
//!
//! A record that passes its level check ends up in exactly one of three
//! outcomes: written by every resolved appender, dropped by at least one of
//! them, or unrouted because no appender was configured. Template failures
//! are counted separately since the record is still written with its raw
//! template.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters owned by a registry
///
/// # Example
///
/// ```
/// use hierarchical_logger::{LogLevel, Registry};
///
/// let registry = Registry::new();
/// // No appender is configured, so the record is counted as unrouted
/// registry.get_logger("app").log(LogLevel::Warn, "lost");
///
/// let snapshot = registry.metrics().snapshot();
/// assert_eq!(snapshot.unrouted, 1);
/// assert_eq!(snapshot.enabled(), 1);
/// ```
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    total_logged: AtomicU64,
    dropped_count: AtomicU64,
    format_errors: AtomicU64,
    unrouted: AtomicU64,
}

/// Point-in-time copy of [`LoggerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total_logged: u64,
    pub dropped_count: u64,
    pub format_errors: u64,
    pub unrouted: u64,
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            format_errors: AtomicU64::new(0),
            unrouted: AtomicU64::new(0),
        }
    }

    /// Records written by every resolved appender
    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    /// Records that at least one appender failed to write
    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Records whose template did not match its arguments
    #[inline]
    pub fn format_errors(&self) -> u64 {
        self.format_errors.load(Ordering::Relaxed)
    }

    /// Enabled records with no appender anywhere up the hierarchy
    #[inline]
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_logged(&self) {
        self.total_logged.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_format_error(&self) {
        self.format_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    ///
    /// Each counter is read independently, so a snapshot taken while other
    /// threads log may not correspond to a single instant.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_logged: self.total_logged(),
            dropped_count: self.dropped_count(),
            format_errors: self.format_errors(),
            unrouted: self.unrouted(),
        }
    }
}

impl MetricsSnapshot {
    /// Records that passed their level check
    pub fn enabled(&self) -> u64 {
        self.total_logged + self.dropped_count + self.unrouted
    }

    /// Counter growth since an earlier snapshot
    pub fn since(&self, earlier: &MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            total_logged: self.total_logged.saturating_sub(earlier.total_logged),
            dropped_count: self.dropped_count.saturating_sub(earlier.dropped_count),
            format_errors: self.format_errors.saturating_sub(earlier.format_errors),
            unrouted: self.unrouted.saturating_sub(earlier.unrouted),
        }
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "logged={} dropped={} format_errors={} unrouted={}",
            self.total_logged, self.dropped_count, self.format_errors, self.unrouted
        )
    }
}
