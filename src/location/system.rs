//! Native OS location services
//!
//! No platform binding ships with the crate: [`UnsupportedSystemLocator`]
//! always reports that the host cannot provide a location, which sends the
//! resolver straight to the IP providers. Platform integrations plug in by
//! implementing [`SystemLocator`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::UserLocation;

/// How long the native service may take before it counts as timed out
pub const SYSTEM_LOCATION_TIMEOUT: Duration = Duration::from_secs(12);

pub const SYSTEM_SOURCE: &str = "system";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SystemLocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location services are disabled")]
    ServicesDisabled,

    #[error("system location timed out")]
    TimedOut,

    #[error("system location is not supported on this OS")]
    Unsupported,

    #[error("{0}")]
    Failed(String),

    #[error("operation cancelled")]
    Cancelled,
}

#[async_trait]
pub trait SystemLocator: Send + Sync {
    async fn locate(&self, cancel: &CancellationToken) -> Result<UserLocation, SystemLocationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSystemLocator;

#[async_trait]
impl SystemLocator for UnsupportedSystemLocator {
    async fn locate(&self, _cancel: &CancellationToken) -> Result<UserLocation, SystemLocationError> {
        Err(SystemLocationError::Unsupported)
    }
}

/// Run `locator` with a deadline, honouring `cancel`. A result without a
/// source is tagged as coming from the system.
pub async fn locate_with_timeout(
    locator: &dyn SystemLocator,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<UserLocation, SystemLocationError> {
    let located = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(SystemLocationError::Cancelled),
        result = tokio::time::timeout(timeout, locator.locate(cancel)) => result,
    };

    let mut location = located.map_err(|_| SystemLocationError::TimedOut)??;
    if location.source.trim().is_empty() {
        location.source = SYSTEM_SOURCE.to_string();
    }
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowLocator;

    #[async_trait]
    impl SystemLocator for SlowLocator {
        async fn locate(&self, _cancel: &CancellationToken) -> Result<UserLocation, SystemLocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(SystemLocationError::Failed("unreachable".into()))
        }
    }

    #[tokio::test]
    async fn test_unsupported_locator() {
        let err = locate_with_timeout(&UnsupportedSystemLocator, SYSTEM_LOCATION_TIMEOUT, &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, SystemLocationError::Unsupported);
    }

    #[tokio::test]
    async fn test_slow_locator_times_out() {
        let err = locate_with_timeout(&SlowLocator, Duration::from_millis(10), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, SystemLocationError::TimedOut);
    }
}
