//! Retry with exponential backoff.
//!
//! [`retry_with_backoff`] wraps any fallible async operation. It knows
//! nothing about what is being retried; whether an error is worth another
//! attempt is decided by [`DebriefError::is_retryable`].

use crate::config::RetrySettings;
use crate::error::{DebriefError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt count and backoff curve.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            multiplier: settings.multiplier.max(1.0),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::immediate(1)
    }

    /// `max_attempts` attempts with no delay between them.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(retry.saturating_sub(1) as i32);
        let millis = (self.initial_backoff.as_millis() as f64 * factor)
            .min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(millis as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&RetrySettings::default())
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted. `op` receives the 1-based attempt number.
///
/// Returns the last error on exhaustion.
pub async fn retry_with_backoff<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                warn!("{}: non-retryable failure: {}", label, e);
                return Err(e);
            }
            Err(e) if attempt >= policy.max_attempts => {
                warn!("{}: giving up after {} attempt(s): {}", label, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    label, attempt, policy.max_attempts, e, delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

/// Treat an empty or whitespace-only completion as a retryable failure.
pub fn require_text(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(DebriefError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}
