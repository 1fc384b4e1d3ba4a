//! Cache-first access to the catalog
//!
//! Reads consult the [`Store`] first and fall back to the [`ContentGateway`]
//! on a miss or a stale entry; successful network reads are written through.
//! A cache that cannot be read is logged and treated as a miss.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use tokio_util::sync::CancellationToken;

use crate::api::{City, ContentGateway, GatewayError, SeatMap, SessionDay, SessionDetail, Theater};
use crate::store::{Cached, Store, StoreResult};

use super::seats::{self, SeatCount};

/// Per-theater session lookup used by the aggregation engine
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn sessions(
        &self,
        city_id: &str,
        theater_id: &str,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError>;
}

#[derive(Clone)]
pub struct CatalogService {
    gateway: Arc<dyn ContentGateway>,
    store: Store,
}

impl CatalogService {
    pub fn new(gateway: Arc<dyn ContentGateway>, store: Store) -> Self {
        Self { gateway, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn gateway(&self) -> &Arc<dyn ContentGateway> {
        &self.gateway
    }

    pub async fn cities(&self, cancel: &CancellationToken) -> Result<Vec<City>, GatewayError> {
        if let Some(cities) = fresh_non_empty(self.store.load_cities(), "cities") {
            return Ok(cities);
        }

        let cities = self.gateway.get_cities(cancel).await?;
        if let Err(e) = self.store.save_cities(&cities) {
            warn!("Failed to cache cities: {}", e);
        }
        Ok(cities)
    }

    /// Cached city list only, regardless of age
    pub fn cached_cities(&self) -> Vec<City> {
        match self.store.load_cities() {
            Ok(cached) => cached.data.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable city cache: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn city_by_name(&self, name: &str, cancel: &CancellationToken) -> Result<City, GatewayError> {
        self.gateway.get_city_by_name(name, cancel).await
    }

    pub async fn theaters(&self, city_id: &str, cancel: &CancellationToken) -> Result<Vec<Theater>, GatewayError> {
        if let Some(theaters) = fresh_non_empty(self.store.load_theaters(city_id), "theaters") {
            return Ok(theaters);
        }

        let theaters = self.gateway.get_theaters(city_id, cancel).await?;
        if let Err(e) = self.store.save_theaters(city_id, &theaters) {
            warn!("Failed to cache theaters for city {}: {}", city_id, e);
        }
        Ok(theaters)
    }

    pub async fn session_days(
        &self,
        city_id: &str,
        theater_id: &str,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError> {
        let date_key = date.format("%Y-%m-%d").to_string();
        if let Some(days) = fresh_non_empty(self.store.load_sessions(city_id, theater_id, &date_key), "sessions") {
            debug!("Session cache hit for {}/{} on {}", city_id, theater_id, date_key);
            return Ok(days);
        }

        let days = self
            .gateway
            .get_sessions(city_id, theater_id, Some(date), cancel)
            .await?;
        // An empty programme may still be published later in the day
        if days.is_empty() {
            return Ok(days);
        }
        if let Err(e) = self.store.save_sessions(city_id, theater_id, &date_key, &days) {
            warn!("Failed to cache sessions for {}/{}: {}", city_id, theater_id, e);
        }
        Ok(days)
    }

    pub async fn session_details(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionDetail, GatewayError> {
        self.gateway.get_session_details(session_id, cancel).await
    }

    pub async fn seat_map(
        &self,
        session_id: &str,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SeatMap, GatewayError> {
        self.gateway.get_seat_map(session_id, section_id, cancel).await
    }

    /// Seat statistics for a session, totalled over every seat-selling section
    pub async fn seat_count(&self, session_id: &str, cancel: &CancellationToken) -> Result<SeatCount, GatewayError> {
        let detail = self.session_details(session_id, cancel).await?;

        let mut total = SeatCount::default();
        for section in detail.seat_sections() {
            let seat_map = self.seat_map(session_id, &section.id, cancel).await?;
            total += seats::score(&seat_map);
        }
        Ok(total)
    }
}

#[async_trait]
impl SessionSource for CatalogService {
    async fn sessions(
        &self,
        city_id: &str,
        theater_id: &str,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError> {
        self.session_days(city_id, theater_id, date, cancel).await
    }
}

fn fresh_non_empty<T>(cached: StoreResult<Cached<Vec<T>>>, what: &str) -> Option<Vec<T>> {
    match cached {
        Ok(cached) => cached.fresh_data().filter(|items| !items.is_empty()),
        Err(e) => {
            warn!("Ignoring unreadable {} cache: {}", what, e);
            None
        }
    }
}
