//! Retry ceiling, retry delays and retry eligibility.
//!
//! The client retries a call only while its [`RetryPredicate`] accepts the
//! failure and the [`RetryStrategy`] ceiling has not been reached. By default
//! transient network failures are retried immediately, up to
//! [`DEFAULT_MAX_RETRIES`] times.

use crate::Error;
use rand::Rng;
use std::time::Duration;

/// Number of retries performed after the first attempt, unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: usize = 10;

/// Defines how many times, and how quickly, failed requests are retried.
///
/// `max_retries` counts *additional* attempts: a call makes at most
/// `max_retries + 1` transport attempts. `max_retries: 0` means a single
/// attempt.
///
/// # Examples
///
/// ```
/// use placefinder::RetryStrategy;
/// use std::time::Duration;
///
/// // Retry straight away, up to 10 times
/// let immediate = RetryStrategy::default();
/// assert_eq!(immediate.max_retries(), 10);
///
/// // Exponential backoff: 100ms, 200ms, 400ms, 800ms...
/// let exponential = RetryStrategy::ExponentialBackoff {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     max_retries: 5,
///     jitter: true,
/// };
///
/// // Fixed delay: 1s, 1s, 1s
/// let linear = RetryStrategy::Linear {
///     delay: Duration::from_secs(1),
///     max_retries: 3,
/// };
/// # let _ = (exponential, linear);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry without waiting between attempts.
    Immediate {
        /// The maximum number of retries.
        max_retries: usize,
    },

    /// Retry with a fixed delay between attempts.
    Linear {
        /// The delay before each retry.
        delay: Duration,
        /// The maximum number of retries.
        max_retries: usize,
    },

    /// Retry with exponentially increasing delays.
    ///
    /// Each retry waits for `initial_delay * 2^(retry - 1)`, capped at `max_delay`.
    ExponentialBackoff {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// The maximum number of retries.
        max_retries: usize,
        /// Whether to scale each delay by a random factor in `0.5..=1.0`.
        jitter: bool,
    },
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy::Immediate {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryStrategy {
    /// Creates an immediate strategy with the given ceiling.
    pub fn immediate(max_retries: usize) -> Self {
        RetryStrategy::Immediate { max_retries }
    }

    /// The retry ceiling.
    pub fn max_retries(&self) -> usize {
        match self {
            RetryStrategy::Immediate { max_retries }
            | RetryStrategy::Linear { max_retries, .. }
            | RetryStrategy::ExponentialBackoff { max_retries, .. } => *max_retries,
        }
    }

    /// Returns the delay before the given retry.
    ///
    /// # Arguments
    ///
    /// * `retry` - The retry number (1-indexed, so 1 = first retry)
    pub fn delay_for_retry(&self, retry: usize) -> Duration {
        match self {
            RetryStrategy::Immediate { .. } => Duration::ZERO,
            RetryStrategy::Linear { delay, .. } => *delay,
            RetryStrategy::ExponentialBackoff {
                initial_delay,
                max_delay,
                jitter,
                ..
            } => {
                let exponent = u32::try_from(retry.saturating_sub(1)).unwrap_or(u32::MAX);
                let multiplier = 2u32.saturating_pow(exponent);
                let delay = initial_delay.saturating_mul(multiplier).min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    delay.mul_f64(jitter_factor)
                } else {
                    delay
                }
            }
        }
    }
}

/// Decides whether a failed attempt should be retried.
///
/// The retry ceiling is enforced by the client independently of the
/// predicate; a predicate only judges the failure itself.
///
/// # Examples
///
/// ```
/// use placefinder::{Error, RetryPredicate, TransportErrorKind};
///
/// /// Only retry timeouts.
/// struct RetryOnTimeout;
///
/// impl RetryPredicate for RetryOnTimeout {
///     fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
///         error.transport_kind() == Some(TransportErrorKind::Timeout)
///     }
/// }
/// ```
pub trait RetryPredicate: Send + Sync {
    /// Determines whether the request should be retried based on the error.
    ///
    /// # Arguments
    ///
    /// * `error` - The failure of the attempt that just finished
    /// * `attempt` - The attempt number (1-indexed)
    fn should_retry(&self, error: &Error, attempt: usize) -> bool;
}

/// Retry every error that [`Error::is_retryable`] accepts.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryOnRetryable;

impl RetryPredicate for RetryOnRetryable {
    fn should_retry(&self, error: &Error, _attempt: usize) -> bool {
        error.is_retryable()
    }
}
