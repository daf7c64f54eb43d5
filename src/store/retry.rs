use crate::error::{ProcessingError, Result};
use crate::store::{StoreError, StoreResult};
use crate::utils::constants::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS};
use std::time::Duration;
use tracing::warn;

/// Fixed-delay retry budget applied to every store call.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    max_attempts: u32,
    /// Pause between consecutive attempts.
    delay: Duration,
    /// Upper bound on the summed pauses of one call.
    deadline: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `op`, sleeping the calling thread between transient failures.
    pub fn run<T, F>(&self, operation: &'static str, op: F) -> Result<T>
    where
        F: FnMut() -> StoreResult<T>,
    {
        self.run_with_sleep(operation, op, std::thread::sleep)
    }

    /// Same as [`RetryPolicy::run`] with the pause supplied by the caller.
    pub fn run_with_sleep<T, F, S>(&self, operation: &'static str, mut op: F, mut sleep: S) -> Result<T>
    where
        F: FnMut() -> StoreResult<T>,
        S: FnMut(Duration),
    {
        let mut attempt = 0u32;
        let mut waited = Duration::ZERO;

        loop {
            attempt += 1;
            let message = match op() {
                Ok(value) => return Ok(value),
                Err(StoreError::Fatal(message)) => return Err(ProcessingError::Store(message)),
                Err(StoreError::Transient(message)) => message,
            };

            let out_of_time = self
                .deadline
                .is_some_and(|deadline| waited + self.delay > deadline);
            if attempt >= self.max_attempts || out_of_time {
                warn!(operation, attempts = attempt, error = %message, "store unavailable, giving up");
                return Err(ProcessingError::StoreUnavailable {
                    operation,
                    attempts: attempt,
                });
            }

            warn!(
                operation,
                attempt,
                error = %message,
                "unable to reach store, retrying in {:?}",
                self.delay
            );
            sleep(self.delay);
            waited += self.delay;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_then_ok(failures: u32) -> impl FnMut() -> StoreResult<&'static str> {
        let mut calls = 0;
        move || {
            calls += 1;
            if calls <= failures {
                Err(StoreError::Transient("connection reset".to_string()))
            } else {
                Ok("found")
            }
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 10);
        assert_eq!(policy.delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_recovers_after_three_transient_failures() {
        let policy = RetryPolicy::default();
        let mut delays = Vec::new();

        let result = policy.run_with_sleep("find_one", failing_then_ok(3), |d| delays.push(d));

        assert_eq!(result.unwrap(), "found");
        assert_eq!(delays, vec![Duration::from_secs(5); 3]);
    }

    #[test]
    fn test_gives_up_after_ten_attempts() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;
        let mut delays = 0;

        let result: Result<()> = policy.run_with_sleep(
            "find_near",
            || {
                attempts += 1;
                Err(StoreError::Transient("connection refused".to_string()))
            },
            |_| delays += 1,
        );

        assert!(matches!(
            result,
            Err(ProcessingError::StoreUnavailable {
                operation: "find_near",
                attempts: 10
            })
        ));
        assert_eq!(attempts, 10);
        assert_eq!(delays, 9);
    }

    #[test]
    fn test_fatal_errors_are_not_retried() {
        let policy = RetryPolicy::default();
        let mut attempts = 0;

        let result: Result<()> = policy.run_with_sleep(
            "save",
            || {
                attempts += 1;
                Err(StoreError::Fatal("duplicate key".to_string()))
            },
            |_| panic!("must not sleep"),
        );

        assert!(matches!(result, Err(ProcessingError::Store(_))));
        assert_eq!(attempts, 1);
    }

    #[test]
    fn test_deadline_stops_retrying_early() {
        let policy = RetryPolicy::default().with_deadline(Some(Duration::from_secs(12)));
        let mut delays = 0;

        let result = policy.run_with_sleep("find_one", failing_then_ok(5), |_| delays += 1);

        assert!(matches!(
            result,
            Err(ProcessingError::StoreUnavailable { attempts: 3, .. })
        ));
        assert_eq!(delays, 2);
    }
}
