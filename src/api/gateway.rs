use async_trait::async_trait;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use super::error::GatewayError;
use super::models::{City, SeatMap, SessionDay, SessionDetail, Theater};

/// Read access to the remote catalog.
///
/// Implemented by [`CatalogClient`](super::CatalogClient) over HTTP; the
/// navigation and aggregation layers only see this trait.
#[async_trait]
pub trait ContentGateway: Send + Sync {
    async fn get_cities(&self, cancel: &CancellationToken) -> Result<Vec<City>, GatewayError>;

    async fn get_city_by_name(&self, name: &str, cancel: &CancellationToken) -> Result<City, GatewayError>;

    async fn get_theaters(&self, city_id: &str, cancel: &CancellationToken) -> Result<Vec<Theater>, GatewayError>;

    async fn get_sessions(
        &self,
        city_id: &str,
        theater_id: &str,
        date: Option<NaiveDate>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError>;

    async fn get_session_details(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionDetail, GatewayError>;

    async fn get_seat_map(
        &self,
        session_id: &str,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SeatMap, GatewayError>;
}
