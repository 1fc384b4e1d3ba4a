//! User location detection
//!
//! The native system service is asked first. When it fails for any reason
//! other than cancellation, the IP providers are tried in order and the first
//! usable answer wins.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::api::DEFAULT_USER_AGENT;

pub mod providers;
pub mod system;

pub use providers::{LocationProvider, ProviderError};
pub use system::{SystemLocationError, SystemLocator, UnsupportedSystemLocator, SYSTEM_LOCATION_TIMEOUT};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub region: String,
    pub country: String,
    /// `system` or the name of the IP provider that answered
    pub source: String,
}

impl UserLocation {
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// e.g. "Sao Paulo, SP (via IP (ipapi))"
    pub fn label(&self) -> String {
        let place = [self.city.trim(), self.region.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let source = source_label(&self.source);

        match (place.is_empty(), source.is_empty()) {
            (false, false) => format!("{} ({})", place, source),
            (false, true) => place,
            _ => source,
        }
    }
}

fn source_label(source: &str) -> String {
    let raw = source.trim();
    if raw.is_empty() {
        return String::new();
    }
    if raw.eq_ignore_ascii_case(system::SYSTEM_SOURCE) {
        "via sistema".to_string()
    } else {
        format!("via IP ({})", raw)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum LocationError {
    #[error("operation cancelled")]
    Cancelled,

    #[error("system location failed ({system}); ip fallback failed ({fallback})")]
    Exhausted { system: String, fallback: String },
}

pub struct LocationResolver {
    system: Arc<dyn SystemLocator>,
    providers: Vec<LocationProvider>,
    http_client: reqwest::Client,
    system_timeout: Duration,
    debug: bool,
}

impl LocationResolver {
    pub fn new(system: Arc<dyn SystemLocator>, providers: Vec<LocationProvider>) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self {
            system,
            providers,
            http_client,
            system_timeout: SYSTEM_LOCATION_TIMEOUT,
            debug: false,
        })
    }

    /// Unsupported system service plus the default provider chain
    pub fn with_defaults() -> anyhow::Result<Self> {
        Self::new(Arc::new(UnsupportedSystemLocator), LocationProvider::defaults())
    }

    /// Log why the system lookup failed and which fallback answered
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_system_timeout(mut self, timeout: Duration) -> Self {
        self.system_timeout = timeout;
        self
    }

    pub async fn detect_location(&self, cancel: &CancellationToken) -> Result<UserLocation, LocationError> {
        let system_error = match system::locate_with_timeout(self.system.as_ref(), self.system_timeout, cancel).await {
            Ok(location) => {
                info!("Location resolved by system service");
                return Ok(location);
            }
            Err(SystemLocationError::Cancelled) => return Err(LocationError::Cancelled),
            Err(e) => e,
        };
        debug!("System location unavailable: {}", system_error);

        match self.detect_with_providers(cancel).await {
            Ok(location) => {
                if self.debug {
                    warn!(
                        "[location] system lookup failed: {}; using fallback source: {}",
                        system_error,
                        if location.source.is_empty() { "unknown" } else { location.source.as_str() }
                    );
                }
                info!("Location resolved by {}", location.source);
                Ok(location)
            }
            Err(ProviderError::Cancelled) => Err(LocationError::Cancelled),
            Err(ProviderError::Failed(fallback)) => Err(LocationError::Exhausted {
                system: system_error.to_string(),
                fallback,
            }),
        }
    }

    async fn detect_with_providers(&self, cancel: &CancellationToken) -> Result<UserLocation, ProviderError> {
        if self.providers.is_empty() {
            return Err(ProviderError::Failed("no location providers configured".to_string()));
        }

        let mut failures = Vec::new();
        for provider in &self.providers {
            match provider.fetch(&self.http_client, cancel).await {
                Ok(location) => return Ok(location),
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
                Err(ProviderError::Failed(message)) => {
                    debug!("Location provider {} failed: {}", provider.name, message);
                    failures.push(format!("{}: {}", provider.name, message));
                }
            }
        }

        Err(ProviderError::Failed(format!(
            "all location providers failed ({})",
            failures.join(" | ")
        )))
    }
}
