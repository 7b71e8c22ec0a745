//! # Circuit Breaker Metrics
//!
//! Cumulative counters for a circuit breaker, kept outside the state lock.

use crate::resilience::CircuitState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of a single circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    /// Component the breaker protects
    pub component: String,

    /// State at the time of the snapshot
    pub current_state: CircuitState,

    /// Failures since the last success or reset
    pub consecutive_failures: u32,

    /// Failures recorded over the breaker's lifetime
    pub total_failures: u64,

    /// Successes recorded over the breaker's lifetime
    pub total_successes: u64,

    /// Closed -> Open transitions
    pub times_opened: u64,

    /// `is_open` checks answered with "open"
    pub rejected_calls: u64,
}

impl CircuitBreakerMetrics {
    /// Fraction of recorded outcomes that were failures (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        let total = self.total_failures + self.total_successes;
        if total == 0 {
            return 0.0;
        }
        self.total_failures as f64 / total as f64
    }

    pub fn is_healthy(&self) -> bool {
        self.current_state == CircuitState::Closed
    }
}

/// Lock-free lifetime counters
#[derive(Debug, Default)]
pub(crate) struct AtomicCircuitBreakerMetrics {
    total_failures: AtomicU64,
    total_successes: AtomicU64,
    times_opened: AtomicU64,
    rejected_calls: AtomicU64,
}

impl AtomicCircuitBreakerMetrics {
    #[inline]
    pub(crate) fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_success(&self) {
        self.total_successes.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_opened(&self) {
        self.times_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_rejection(&self) {
        self.rejected_calls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        component: &str,
        state: CircuitState,
        consecutive_failures: u32,
    ) -> CircuitBreakerMetrics {
        CircuitBreakerMetrics {
            component: component.to_string(),
            current_state: state,
            consecutive_failures,
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_successes: self.total_successes.load(Ordering::Relaxed),
            times_opened: self.times_opened.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
        }
    }
}
