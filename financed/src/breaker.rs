//! A circuit breaker for calls to a remote service.
//!
//! The breaker counts consecutive failures. Once `failure_threshold` is
//! reached it opens and rejects calls outright for `open_for`. After that it
//! lets a single trial call through: success closes the breaker, failure opens
//! it again. A trial that is dropped before it reports counts as a failure.

use serde::{Deserialize, Serialize};
use std::{
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::time::Instant;
use tracing::{Level, event};

/// Thresholds for a [`CircuitBreaker`]
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct BreakerConfig {
    /// Consecutive failures that open the breaker
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// How long an open breaker rejects calls before allowing a trial
    #[serde(default = "default_open_for", with = "humantime_serde")]
    pub open_for: Duration,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_open_for() -> Duration {
    Duration::from_secs(30)
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            open_for: default_open_for(),
        }
    }
}

/// The externally visible state of a breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls pass through
    Closed,
    /// Calls are rejected
    Open,
    /// One trial call is in flight
    HalfOpen,
}

#[derive(Debug)]
enum State {
    Closed { failures: u32 },
    Open { until: Instant },
    HalfOpen,
}

/// Returned by [`CircuitBreaker::acquire`] when a call may not proceed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("circuit breaker is open")]
pub struct BreakerOpen;

/// A thread-safe circuit breaker.
///
/// Callers ask for a [`Permit`] with [`acquire`](Self::acquire), make the
/// call, and settle the permit with the outcome.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: Mutex<State>,
}

impl CircuitBreaker {
    /// Create a closed breaker
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::Closed { failures: 0 }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a poisoned lock still holds a valid state
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current state
    pub fn state(&self) -> BreakerState {
        match *self.lock() {
            State::Closed { .. } => BreakerState::Closed,
            State::Open { until } if Instant::now() >= until => BreakerState::HalfOpen,
            State::Open { .. } => BreakerState::Open,
            State::HalfOpen => BreakerState::HalfOpen,
        }
    }

    /// Ask whether a call may proceed.
    ///
    /// An open breaker whose waiting period has passed moves to half-open and
    /// admits exactly one caller; everyone else is rejected until that trial
    /// is settled. A trial permit dropped without being settled counts as a
    /// failure.
    pub fn acquire(&self) -> Result<Permit<'_>, BreakerOpen> {
        let mut state = self.lock();
        match *state {
            State::Closed { .. } => Ok(Permit::new(self, false)),
            State::Open { until } if Instant::now() >= until => {
                *state = State::HalfOpen;
                event!(Level::INFO, "circuit breaker half-open, allowing a trial call");
                Ok(Permit::new(self, true))
            }
            State::Open { .. } | State::HalfOpen => Err(BreakerOpen),
        }
    }

    fn record_success(&self) {
        let mut state = self.lock();
        if matches!(*state, State::HalfOpen) {
            event!(Level::INFO, "circuit breaker closed");
        }
        *state = State::Closed { failures: 0 };
    }

    fn record_failure(&self) {
        let mut state = self.lock();
        let failures = match *state {
            State::Closed { failures } => failures + 1,
            State::HalfOpen => self.config.failure_threshold,
            State::Open { .. } => return,
        };
        if failures >= self.config.failure_threshold {
            event!(
                Level::WARN,
                failures,
                open_for = ?self.config.open_for,
                "circuit breaker opened"
            );
            *state = State::Open {
                until: Instant::now() + self.config.open_for,
            };
        } else {
            *state = State::Closed { failures };
        }
    }
}

/// Permission for one call through a [`CircuitBreaker`].
///
/// Settle it with [`succeed`](Self::succeed) or [`fail`](Self::fail).
#[derive(Debug)]
#[must_use = "an unsettled trial permit reopens the breaker"]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: bool,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, trial: bool) -> Self {
        Self {
            breaker,
            trial,
            settled: false,
        }
    }

    /// Whether this is the single call admitted by a half-open breaker
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Report a successful call
    pub fn succeed(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    /// Report a failed call
    pub fn fail(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        // an abandoned trial must not leave the breaker half-open forever
        if self.trial && !self.settled {
            event!(Level::DEBUG, "trial call abandoned");
            self.breaker.record_failure();
        }
    }
}
