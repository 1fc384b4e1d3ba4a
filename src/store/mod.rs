//! File-backed persistence for catalog caches and user preferences
//!
//! Two directories are managed:
//! - the cache directory holds TTL-governed catalog snapshots
//!   (`cities.json`, `theaters_<city>.json`, `sessions_<city>_<theater>_<date>.json`)
//! - the config directory holds small preference records
//!   (`history.json`, `theaters.json`, `theater_visibility.json`)
//!
//! Every write replaces the whole file. There is no locking; one interactive
//! instance is expected and the last writer wins.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::models::{City, SessionDay, Theater};

pub mod repository;

pub use repository::history::{RecentCity, RecentTheater, MAX_RECENT_CITIES, MAX_RECENT_THEATERS};

/// Directory name used under the platform cache and config directories
pub const APP_DIR_NAME: &str = "ingresso-finder";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    InvalidFormat(String),

    #[error("{0}")]
    InvalidInput(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The three cached datasets and their freshness windows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Cities,
    Theaters,
    Sessions,
}

impl CacheKind {
    pub fn ttl(self) -> Duration {
        match self {
            CacheKind::Cities => Duration::days(7),
            CacheKind::Theaters => Duration::hours(72),
            CacheKind::Sessions => Duration::minutes(10),
        }
    }

    /// An entry is fresh while `now - updated_at <= ttl`
    pub fn is_fresh(self, updated_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(updated_at) <= self.ttl()
    }
}

/// On-disk wrapper around every cached dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    pub updated_at: DateTime<Utc>,
    pub data: T,
}

/// Result of a cache read. A missing file is `data: None`, never an error.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub data: Option<T>,
    pub updated_at: Option<DateTime<Utc>>,
    pub fresh: bool,
}

impl<T> Cached<T> {
    pub fn miss() -> Self {
        Self {
            data: None,
            updated_at: None,
            fresh: false,
        }
    }

    /// The data, only when it is still within its TTL
    pub fn fresh_data(self) -> Option<T> {
        if self.fresh { self.data } else { None }
    }
}

/// Source of the current time for cache timestamps and freshness checks
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Handle on the cache and config directories
#[derive(Clone)]
pub struct Store {
    cache_dir: PathBuf,
    config_dir: PathBuf,
    clock: Clock,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("cache_dir", &self.cache_dir)
            .field("config_dir", &self.config_dir)
            .finish_non_exhaustive()
    }
}

impl Store {
    pub fn new(cache_dir: impl Into<PathBuf>, config_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            config_dir: config_dir.into(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock, e.g. to age cache entries in tests
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub(crate) fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    pub(crate) fn config_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(name)
    }

    pub(crate) fn load_envelope<T: DeserializeOwned>(&self, kind: CacheKind, path: &Path) -> StoreResult<Cached<T>> {
        let Some(envelope) = read_json::<CacheEnvelope<T>>(path)? else {
            return Ok(Cached::miss());
        };

        Ok(Cached {
            fresh: kind.is_fresh(envelope.updated_at, self.now()),
            updated_at: Some(envelope.updated_at),
            data: Some(envelope.data),
        })
    }

    pub(crate) fn save_envelope<T: Serialize>(
        &self,
        path: &Path,
        data: &T,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        write_json(path, &CacheEnvelope { updated_at, data })
    }

    pub fn load_cities(&self) -> StoreResult<Cached<Vec<City>>> {
        repository::catalog_cache::load_cities(self)
    }

    pub fn save_cities(&self, cities: &[City]) -> StoreResult<()> {
        repository::catalog_cache::save_cities(self, cities)
    }

    pub fn load_theaters(&self, city_id: &str) -> StoreResult<Cached<Vec<Theater>>> {
        repository::catalog_cache::load_theaters(self, city_id)
    }

    pub fn save_theaters(&self, city_id: &str, theaters: &[Theater]) -> StoreResult<()> {
        repository::catalog_cache::save_theaters(self, city_id, theaters)
    }

    pub fn load_sessions(&self, city_id: &str, theater_id: &str, date: &str) -> StoreResult<Cached<Vec<SessionDay>>> {
        repository::catalog_cache::load_sessions(self, city_id, theater_id, date)
    }

    pub fn save_sessions(&self, city_id: &str, theater_id: &str, date: &str, days: &[SessionDay]) -> StoreResult<()> {
        repository::catalog_cache::save_sessions(self, city_id, theater_id, date, days)
    }

    pub fn load_recent_cities(&self) -> StoreResult<Vec<RecentCity>> {
        repository::history::load_recent_cities(self)
    }

    pub fn remember_city(&self, city: &City) -> StoreResult<()> {
        repository::history::remember_city(self, city)
    }

    pub fn load_recent_theaters(&self) -> StoreResult<Vec<RecentTheater>> {
        repository::history::load_recent_theaters(self)
    }

    pub fn remember_theater(&self, city_id: &str, theater: &Theater) -> StoreResult<()> {
        repository::history::remember_theater(self, city_id, theater)
    }

    pub fn load_hidden_theaters(&self, city_id: &str) -> StoreResult<HashSet<String>> {
        repository::visibility::load_hidden_theaters(self, city_id)
    }

    pub fn set_theater_hidden(&self, city_id: &str, theater_id: &str, hidden: bool) -> StoreResult<()> {
        repository::visibility::set_theater_hidden(self, city_id, theater_id, hidden)
    }
}

/// Read and decode a JSON file; `Ok(None)` when it does not exist
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<Option<T>> {
    let Some(bytes) = read_bytes(path)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Decode {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn read_bytes(path: &Path) -> StoreResult<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Pretty-print `value` and replace the file, creating parent directories
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }

    let payload = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, payload).map_err(io_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_boundaries() {
        let now = Utc::now();

        assert!(CacheKind::Sessions.is_fresh(now - Duration::minutes(10), now));
        assert!(!CacheKind::Sessions.is_fresh(now - Duration::minutes(10) - Duration::seconds(1), now));

        assert!(CacheKind::Theaters.is_fresh(now - Duration::hours(71), now));
        assert!(!CacheKind::Theaters.is_fresh(now - Duration::hours(73), now));

        assert!(CacheKind::Cities.is_fresh(now - Duration::days(6), now));
        assert!(!CacheKind::Cities.is_fresh(now - Duration::days(8), now));
    }

    #[test]
    fn test_freshness_follows_the_store_clock() {
        let dir = tempfile::tempdir().unwrap();
        let saved_at = Utc::now();
        let offset = Arc::new(std::sync::Mutex::new(Duration::zero()));
        let clock_offset = offset.clone();
        let store = Store::new(dir.path().join("cache"), dir.path().join("config"))
            .with_clock(move || saved_at + *clock_offset.lock().unwrap());

        let days = vec![SessionDay::default()];
        store.save_sessions("1", "t1", "2025-03-01", &days).unwrap();
        assert!(store.load_sessions("1", "t1", "2025-03-01").unwrap().fresh);

        *offset.lock().unwrap() = Duration::minutes(10);
        assert!(store.load_sessions("1", "t1", "2025-03-01").unwrap().fresh);

        *offset.lock().unwrap() = Duration::minutes(11);
        let cached = store.load_sessions("1", "t1", "2025-03-01").unwrap();
        assert!(!cached.fresh);
        assert_eq!(cached.updated_at, Some(saved_at));
    }

    #[test]
    fn test_missing_file_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("cache"), dir.path().join("config"));

        let cached = store.load_cities().unwrap();
        assert!(cached.data.is_none());
        assert!(!cached.fresh);
    }
}
