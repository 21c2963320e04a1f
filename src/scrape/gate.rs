//! Admission control for outbound requests
//!
//! The gate enforces two independent limits before a request may proceed:
//! - a concurrency bound (at most N requests in flight), via a semaphore
//! - a smoothed rate bound (admissions at least `1/R` seconds apart)
//!
//! A caller first waits for a concurrency permit and only then reserves its
//! rate slot. Callers queued behind the concurrency bound therefore never burn
//! rate slots they cannot use.

use crate::config::LimitsConfig;
use crate::ScrapeError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Held for the duration of one dispatch; dropping it frees the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

/// Combined concurrency + rate admission controller
#[derive(Debug)]
pub struct Gate {
    permits: Arc<Semaphore>,
    max_in_flight: usize,

    /// Minimum spacing between two admissions
    spacing: Duration,

    /// Earliest instant the next admission may happen
    next_admission: Mutex<Option<Instant>>,
}

impl Gate {
    /// Creates a gate admitting at most `max_in_flight` concurrent requests
    /// and at most `rate_per_sec` admissions per second
    ///
    /// A zero `max_in_flight` is raised to 1. A rate that is not a positive
    /// finite number fails with `InvalidRate`.
    pub fn new(max_in_flight: usize, rate_per_sec: f64) -> Result<Self, ScrapeError> {
        if !rate_per_sec.is_finite() || rate_per_sec <= 0.0 {
            return Err(ScrapeError::InvalidRate(rate_per_sec));
        }

        let max_in_flight = max_in_flight.max(1);
        Ok(Self {
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            spacing: Duration::from_secs_f64(1.0 / rate_per_sec),
            next_admission: Mutex::new(None),
        })
    }

    pub fn from_config(config: &LimitsConfig) -> Result<Self, ScrapeError> {
        Self::new(config.max_active_queries, config.max_query_rate)
    }

    /// Waits until both limits admit one more request
    ///
    /// Suspends cooperatively; other tasks keep running while this one waits.
    pub async fn acquire(&self) -> Result<GatePermit, ScrapeError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ScrapeError::GateClosed)?;

        let admit_at = self.reserve_slot(Instant::now());
        tokio::time::sleep_until(admit_at).await;

        Ok(GatePermit { _permit: permit })
    }

    /// Claims the next free rate slot at or after `now`
    fn reserve_slot(&self, now: Instant) -> Instant {
        let mut next = self
            .next_admission
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let admit_at = match *next {
            Some(at) if at > now => at,
            _ => now,
        };
        *next = Some(admit_at + self.spacing);
        admit_at
    }

    /// Number of permits currently held
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}
