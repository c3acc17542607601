//! Bounded polling with exponential backoff.

use std::future::Future;
use std::time::Duration;

use cluster::ClusterError;
use incident::VerificationOutcome;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// One observation of the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The post-condition holds; carries what was observed.
    Done(String),
    /// Not yet; carries what was observed.
    Pending(String),
}

/// Doubling delay, capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            next: initial.min(max),
            max,
        }
    }

    /// The delay to wait now; advances the sequence.
    pub fn next_delay(&mut self) -> Duration {
        let current = self.next;
        self.next = (current * 2).min(self.max);
        current
    }
}

/// Probe until the post-condition holds or `deadline` elapses.
///
/// The first probe runs immediately. A probe error ends polling with
/// [`VerificationOutcome::Failed`]; running out of time yields
/// [`VerificationOutcome::TimedOut`] with the last observation.
pub async fn poll_until<F, Fut>(
    deadline: Duration,
    mut backoff: Backoff,
    mut probe: F,
) -> VerificationOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Probe, ClusterError>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let last = match probe().await {
            Ok(Probe::Done(details)) => {
                debug!(attempts, "Post-condition observed");
                return VerificationOutcome::Confirmed(details);
            }
            Ok(Probe::Pending(observed)) => observed,
            Err(e) => return VerificationOutcome::Failed(e.to_string()),
        };

        let elapsed = started.elapsed();
        if elapsed >= deadline {
            debug!(attempts, "Verification deadline reached");
            return VerificationOutcome::TimedOut(last);
        }

        let delay = backoff.next_delay().min(deadline - elapsed);
        debug!(attempts, observed = %last, delay_ms = delay.as_millis(), "Post-condition not met yet");
        sleep(delay).await;
    }
}
