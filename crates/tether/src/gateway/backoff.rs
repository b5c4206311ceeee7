//! Dial retry policy.

use std::future::Future;
use std::time::Duration;

/// How long to wait between failed dials, and when to stop dialing.
///
/// The wait doubles (by `factor`) after every consecutive failure, starting
/// at `first_delay` and never exceeding `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct DialBackoff {
    /// Wait after the first failed dial.
    pub first_delay: Duration,
    /// Ceiling for the wait.
    pub max_delay: Duration,
    /// Growth per consecutive failure.
    pub factor: f64,
    /// Stop after this many consecutive failures. `None` dials forever.
    pub give_up_after: Option<u32>,
}

impl Default for DialBackoff {
    fn default() -> Self {
        Self {
            first_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            factor: 2.0,
            give_up_after: None,
        }
    }
}

impl DialBackoff {
    /// Wait that follows the `failures`-th consecutive failure (1-based).
    #[must_use]
    pub fn delay_after(&self, failures: u32) -> Duration {
        let mut delay = self.first_delay.min(self.max_delay);
        for _ in 1..failures {
            if delay >= self.max_delay {
                break;
            }
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * self.factor)
                .unwrap_or(self.max_delay)
                .min(self.max_delay);
        }
        delay
    }

    /// Whether `failures` consecutive failures use up the policy.
    #[must_use]
    pub const fn exhausted(&self, failures: u32) -> bool {
        match self.give_up_after {
            Some(limit) => failures >= limit,
            None => false,
        }
    }
}

/// Call `dial` until it succeeds or `policy` is exhausted.
///
/// `on_failure` sees each error with its failure count and the wait before
/// the next try, or `None` when giving up.
pub async fn dial_with_backoff<D, Fut, T, E, L>(
    policy: &DialBackoff,
    mut dial: D,
    mut on_failure: L,
) -> Result<T, E>
where
    D: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    L: FnMut(u32, &E, Option<Duration>),
{
    let mut failures = 0;
    loop {
        let err = match dial().await {
            Ok(connected) => return Ok(connected),
            Err(err) => err,
        };
        failures += 1;

        if policy.exhausted(failures) {
            on_failure(failures, &err, None);
            return Err(err);
        }
        let wait = policy.delay_after(failures);
        on_failure(failures, &err, Some(wait));
        tokio::time::sleep(wait).await;
    }
}
