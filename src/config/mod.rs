//! Application configuration
//!
//! Settings are layered, later layers winning:
//! 1. built-in defaults
//! 2. `<config_dir>/ingresso-finder/config.toml`, when present
//! 3. environment variables (a `.env` file in the working directory is honoured)
//! 4. command-line flags, applied by the binary

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::{ClientConfig, RetryConfig};
use crate::catalog::aggregate::DEFAULT_CONCURRENCY;
use crate::store::{Store, APP_DIR_NAME};

pub const CITY_ENV: &str = "INGRESSO_CITY";
pub const LOCATION_DEBUG_ENV: &str = "INGRESSO_LOCATION_DEBUG";
pub const RETRY_JITTER_ENV: &str = "INGRESSO_RETRY_JITTER";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    /// Scale each wait by a random factor in `[0.5, 1.5]`
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 1200,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        RetryConfig {
            max_attempts: settings.max_attempts.max(1),
            base_delay: Duration::from_millis(settings.base_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: if settings.backoff_multiplier >= 1.0 {
                settings.backoff_multiplier
            } else {
                1.0
            },
            jitter: settings.jitter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// City opened at startup instead of the most recent one
    pub initial_city: Option<String>,
    pub location_debug: bool,
    pub cache_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
    pub aggregation_concurrency: usize,
    pub retry: RetrySettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            initial_city: None,
            location_debug: false,
            cache_dir: None,
            config_dir: None,
            http_timeout_secs: 12,
            aggregation_concurrency: DEFAULT_CONCURRENCY,
            retry: RetrySettings::default(),
        }
    }
}

impl AppConfig {
    /// Platform config directory for the application
    pub fn default_config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME))
    }

    /// Defaults, then the config file, then the environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {}", e);
        }

        let path = Self::default_config_dir()?.join(CONFIG_FILE_NAME);
        let mut config = Self::from_file(&path)?.unwrap_or_default();
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file; `Ok(None)` when it does not exist
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            log::debug!("No config file at {:?}", path);
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        log::info!("Loaded config from {:?}", path);
        Ok(Some(config))
    }

    /// Overlay `INGRESSO_*` variables; `lookup` abstracts the environment
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(city) = lookup(CITY_ENV).map(|v| v.trim().to_string()) {
            if !city.is_empty() {
                self.initial_city = Some(city);
            }
        }
        if let Some(flag) = lookup(LOCATION_DEBUG_ENV) {
            if !flag.trim().is_empty() {
                self.location_debug = true;
            }
        }
        if let Some(flag) = lookup(RETRY_JITTER_ENV) {
            match flag.trim().to_ascii_lowercase().as_str() {
                "" => {}
                "0" | "false" | "no" | "off" => self.retry.jitter = false,
                _ => self.retry.jitter = true,
            }
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.http_timeout_secs.max(1)),
            retry: RetryConfig::from(&self.retry),
            ..ClientConfig::default()
        }
    }

    pub fn store(&self) -> Result<Store> {
        let cache_dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .context("Failed to get user cache directory")?
                .join(APP_DIR_NAME),
        };
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => Self::default_config_dir()?,
        };
        Ok(Store::new(cache_dir, config_dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"
initial_city = "Recife"
aggregation_concurrency = 2

[retry]
max_attempts = 5
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(config.initial_city.as_deref(), Some("Recife"));
        assert_eq!(config.aggregation_concurrency, 2);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, 200);
        assert_eq!(config.http_timeout_secs, 12);
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppConfig::from_file(&dir.path().join("nope.toml")).unwrap().is_none());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([(CITY_ENV, " Natal "), (LOCATION_DEBUG_ENV, "1")]);
        let mut config = AppConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.initial_city.as_deref(), Some("Natal"));
        assert!(config.location_debug);

        let mut untouched = AppConfig::default();
        untouched.apply_env(|key| if key == CITY_ENV { Some("   ".into()) } else { None });
        assert_eq!(untouched.initial_city, None);
    }

    #[test]
    fn test_retry_settings_convert() {
        let retry = RetryConfig::from(&RetrySettings::default());
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_delay, Duration::from_millis(200));
        assert_eq!(retry.max_delay, Duration::from_millis(1200));
        assert_eq!(retry.backoff_multiplier, 2.0);
        assert!(!retry.jitter);
    }

    #[test]
    fn test_retry_jitter_from_file_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[retry]\nbackoff_multiplier = 3.0\njitter = true\n").unwrap();

        let mut config = AppConfig::from_file(&path).unwrap().unwrap();
        let retry = RetryConfig::from(&config.retry);
        assert_eq!(retry.backoff_multiplier, 3.0);
        assert!(retry.jitter);

        config.apply_env(|key| if key == RETRY_JITTER_ENV { Some("off".into()) } else { None });
        assert!(!config.retry.jitter);
        config.apply_env(|key| if key == RETRY_JITTER_ENV { Some("1".into()) } else { None });
        assert!(config.retry.jitter);
    }
}
