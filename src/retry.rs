//! Bounded retry with a fixed delay.

use std::fmt::Display;
use std::time::Duration;

/// How many times to try and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub attempts: u32,
    /// Pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    fn max_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

/// The last error once every attempt has failed.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

/// Run `op` until it succeeds or the policy is used up.
///
/// `op` receives the 1-based attempt number. `should_retry` can stop early
/// for errors that retrying won't fix.
pub fn retry_fixed<T, E, F, R>(
    policy: RetryPolicy,
    label: &str,
    should_retry: R,
    mut op: F,
) -> Result<T, Exhausted<E>>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
    R: Fn(&E) -> bool,
{
    let max = policy.max_attempts();
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max && should_retry(&err) => {
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {}s",
                    label,
                    attempt,
                    max,
                    err,
                    policy.delay.as_secs()
                );
                std::thread::sleep(policy.delay);
                attempt += 1;
            }
            Err(err) => {
                return Err(Exhausted {
                    attempts: attempt,
                    last_error: err,
                })
            }
        }
    }
}
