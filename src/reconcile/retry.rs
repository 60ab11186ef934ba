//! Retry policy for provider calls made during bulk import.
//!
//! Implements exponential backoff with configurable parameters.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::ImportSettings;
use crate::tmdb::ProviderError;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    /// Cap for exponential growth.
    pub max_backoff: Duration,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: settings.initial_backoff,
            max_backoff: settings.max_backoff,
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// Never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry_count` (0-based):
    /// `initial_backoff * multiplier^retry_count`, capped at `max_backoff`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let backoff =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        Duration::from_secs_f64(backoff.min(self.max_backoff.as_secs_f64()))
    }

    /// Only transient provider failures are retried, and only while retries
    /// remain.
    pub fn should_retry(&self, error: &ProviderError, retry_count: u32) -> bool {
        error.is_transient() && retry_count < self.max_retries
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of
    /// retries.
    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut retry_count = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if self.should_retry(&err, retry_count) => {
                    let wait = self.backoff(retry_count);
                    warn!(
                        "{} failed ({}), retrying in {}ms",
                        what,
                        err,
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                    retry_count += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&ImportSettings::default())
    }
}
