//! Synchronous polling on the calling thread.
//!
//! Used by discovery waits: a probe is called until it reports ready or the
//! deadline passes. Probe errors are not retried; transient failures are the
//! probe's own concern.

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use crate::config::BaseEntityConfig;

/// Shortest pause between probes, so a zero interval does not spin.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Deadline and poll interval for a wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Total time to wait. Zero means a single probe.
    pub timeout: Duration,
    /// Delay between probes, never shorter than [`MIN_POLL_INTERVAL`].
    pub interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Builds the discovery wait policy from an entity configuration.
    pub fn discovery(config: &BaseEntityConfig) -> Self {
        Self::new(
            Duration::from_secs(config.discovery_timeout_secs),
            Duration::from_secs(config.discovery_poll_interval_secs),
        )
    }
}

/// What a single probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    Ready(T),
    Pending(T),
}

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome<T> {
    Ready(T),
    /// The deadline passed; carries the last observation.
    TimedOut(T),
}

/// Calls `probe` until it returns [`Probe::Ready`] or `policy.timeout` elapses.
///
/// The probe always runs at least once. Sleeps never overshoot the deadline by
/// more than the time one probe takes. A timeout too large to represent as an
/// [`Instant`] waits without a deadline.
pub fn wait_until<T, F>(
    policy: &WaitPolicy,
    description: &str,
    mut probe: F,
) -> Result<WaitOutcome<T>>
where
    F: FnMut() -> Result<Probe<T>>,
{
    let deadline = Instant::now().checked_add(policy.timeout);
    let interval = policy.interval.max(MIN_POLL_INTERVAL);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        let observed = match probe()? {
            Probe::Ready(value) => {
                debug!("{} satisfied after {} probe(s)", description, attempt);
                return Ok(WaitOutcome::Ready(value));
            }
            Probe::Pending(value) => value,
        };

        let now = Instant::now();
        let pause = match deadline {
            Some(deadline) if now >= deadline => {
                debug!("{} not satisfied after {} probe(s), giving up", description, attempt);
                return Ok(WaitOutcome::TimedOut(observed));
            }
            Some(deadline) => interval.min(deadline - now),
            None => interval,
        };
        debug!("{} pending (probe {}), next probe in {:?}", description, attempt, pause);
        thread::sleep(pause);
    }
}
