//! # Circuit Breaker Implementation
//!
//! Two-state breaker: Closed (calls allowed) and Open (calls short-circuited).
//! The breaker opens once the failure counter reaches the threshold and
//! closes again on the first `is_open` check made more than `timeout` after
//! the last recorded failure. That check lets the next call through as a
//! trial; a success keeps the circuit closed.

use crate::clock::SharedClock;
use crate::resilience::metrics::AtomicCircuitBreakerMetrics;
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerMetrics};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed,
    /// Failure mode - calls fail fast without executing
    Open,
}

/// Counter, timestamp and state; always updated together
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    last_failure_millis: Option<u64>,
}

/// Failure-counting circuit breaker
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging and metrics
    name: String,

    config: CircuitBreakerConfig,

    clock: SharedClock,

    inner: Mutex<BreakerState>,

    metrics: AtomicCircuitBreakerMetrics,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, clock: SharedClock) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_ms = config.timeout.as_millis() as u64,
            "Circuit breaker initialized"
        );

        Self {
            name,
            config,
            clock,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                last_failure_millis: None,
            }),
            metrics: AtomicCircuitBreakerMetrics::default(),
        }
    }

    /// Whether callers should skip the protected operation.
    ///
    /// An open circuit whose timeout has elapsed since the last failure is
    /// closed here, with the failure counter reset.
    pub fn is_open(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::Closed {
            return false;
        }

        let now = self.clock.now_millis();
        let since_last_failure = inner
            .last_failure_millis
            .map(|last| now.saturating_sub(last))
            .unwrap_or(u64::MAX);

        if since_last_failure > self.config.timeout.as_millis() as u64 {
            inner.state = CircuitState::Closed;
            inner.failure_count = 0;
            info!(
                component = %self.name,
                elapsed_ms = since_last_failure,
                "Circuit breaker closed after timeout (allowing trial call)"
            );
            return false;
        }

        self.metrics.record_rejection();
        true
    }

    /// Count a failure and open the circuit once the threshold is reached.
    pub fn record_failure(&self) {
        self.metrics.record_failure();

        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);
        inner.last_failure_millis = Some(self.clock.now_millis());

        if inner.failure_count >= self.config.failure_threshold
            && inner.state != CircuitState::Open
        {
            inner.state = CircuitState::Open;
            self.metrics.record_opened();
            error!(
                component = %self.name,
                consecutive_failures = inner.failure_count,
                failure_threshold = self.config.failure_threshold,
                timeout_ms = self.config.timeout.as_millis() as u64,
                "Circuit breaker opened (failing fast)"
            );
        } else {
            debug!(
                component = %self.name,
                consecutive_failures = inner.failure_count,
                "Failure recorded"
            );
        }
    }

    /// Reset the failure counter and force the circuit closed.
    pub fn record_success(&self) {
        self.metrics.record_success();

        let mut inner = self.inner.lock();
        inner.failure_count = 0;
        if inner.state == CircuitState::Open {
            info!(component = %self.name, "Circuit breaker closed (recovered)");
        }
        inner.state = CircuitState::Closed;
    }

    /// Current state without applying the timeout transition
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Failures since the last success or reset
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }

    /// Force circuit to open state (for emergency situations)
    pub fn force_open(&self) {
        warn!(component = %self.name, "Circuit breaker forced open");
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            self.metrics.record_opened();
        }
        inner.state = CircuitState::Open;
        inner.last_failure_millis = Some(self.clock.now_millis());
    }

    /// Force circuit to closed state (for emergency recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let inner = self.inner.lock();
        self.metrics
            .snapshot(&self.name, inner.state, inner.failure_count)
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}
