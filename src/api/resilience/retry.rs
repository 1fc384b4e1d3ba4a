//! Retry policies with exponential backoff
//!
//! Transient catalog failures (rate limits, 5xx, dropped connections) are
//! retried a bounded number of times; the wait between attempts is raced
//! against the caller's cancellation token.

use std::future::Future;
use std::time::Duration;

use log::{debug, info, warn};
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::api::error::GatewayError;

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_millis(1200),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Types of errors and their retry behavior
#[derive(Debug, Clone, PartialEq)]
pub enum RetryableError {
    /// Connection reset, DNS failure and the like
    Network,
    /// HTTP 5xx
    ServerError(u16),
    /// HTTP 429
    RateLimited,
    /// Request deadline hit; the caller's budget is spent
    Deadline,
    /// Any other 4xx
    ClientError(u16),
    Cancelled,
    Unknown,
}

impl RetryableError {
    pub fn should_retry(&self) -> bool {
        matches!(
            self,
            RetryableError::Network | RetryableError::ServerError(_) | RetryableError::RateLimited
        )
    }

    pub fn from_status_code(status: u16) -> Self {
        match status {
            429 => RetryableError::RateLimited,
            400..=499 => RetryableError::ClientError(status),
            500..=599 => RetryableError::ServerError(status),
            _ => RetryableError::Unknown,
        }
    }

    pub fn from_gateway_error(error: &GatewayError) -> Self {
        match error {
            GatewayError::Api { status, .. } => Self::from_status_code(*status),
            GatewayError::Network { timeout: true, .. } => RetryableError::Deadline,
            GatewayError::Network { .. } => RetryableError::Network,
            GatewayError::Cancelled => RetryableError::Cancelled,
            _ => RetryableError::Unknown,
        }
    }
}

/// Retry policy that implements exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation, retrying transient failures until it succeeds,
    /// fails permanently, runs out of attempts or `cancel` fires.
    pub async fn execute<F, Fut, T>(&self, cancel: &CancellationToken, operation: F) -> Result<T, GatewayError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }

            debug!("Executing operation (attempt {}/{})", attempt, max_attempts);

            let error = tokio::select! {
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                result = operation() => match result {
                    Ok(value) => {
                        if attempt > 1 {
                            info!("Operation succeeded after {} attempts", attempt);
                        }
                        return Ok(value);
                    }
                    Err(error) => error,
                },
            };

            let should_retry = RetryableError::from_gateway_error(&error).should_retry();
            if !should_retry || attempt >= max_attempts {
                warn!(
                    "Operation failed permanently on attempt {} (should_retry: {}): {}",
                    attempt, should_retry, error
                );
                return Err(error);
            }

            warn!("Operation failed on attempt {} (retryable): {}", attempt, error);

            let delay = self.calculate_delay(attempt);
            debug!("Waiting {:?} before retry", delay);
            tokio::select! {
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// `min(max_delay, base_delay * multiplier^(attempt - 1))`, optionally jittered
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) as i32 - 1;
        let delay_ms = (self.config.base_delay.as_millis() as f64)
            * self.config.backoff_multiplier.powi(exponent);

        let mut delay = if delay_ms >= self.config.max_delay.as_millis() as f64 {
            self.config.max_delay
        } else {
            Duration::from_millis(delay_ms as u64)
        };

        if self.config.jitter {
            let jitter_factor = rand::rng().random_range(0.5..=1.5);
            delay = Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64);
        }

        delay
    }
}
