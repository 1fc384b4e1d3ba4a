use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use super::error::GatewayError;
use super::gateway::ContentGateway;
use super::models::{City, SeatMap, SessionDay, SessionDetail, State, Theater};
use super::resilience::{RetryConfig, RetryPolicy};

pub const CONTENT_BASE_URL: &str = "https://api-content.ingresso.com/v0";
pub const CHECKOUT_BASE_URL: &str = "https://api.ingresso.com/v1";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5.2 Safari/605.1.15";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub content_base_url: String,
    pub checkout_base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            content_base_url: CONTENT_BASE_URL.to_string(),
            checkout_base_url: CHECKOUT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(12),
            retry: RetryConfig::default(),
        }
    }
}

/// HTTP client for the Ingresso content and checkout APIs
#[derive(Clone)]
pub struct CatalogClient {
    content_base_url: String,
    checkout_base_url: String,
    http_client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            content_base_url: config.content_base_url.trim_end_matches('/').to_string(),
            checkout_base_url: config.checkout_base_url.trim_end_matches('/').to_string(),
            http_client,
            retry_policy: RetryPolicy::new(config.retry),
        })
    }

    async fn get_json<T>(&self, endpoint: String, cancel: &CancellationToken) -> Result<T, GatewayError>
    where
        T: DeserializeOwned + Default,
    {
        self.retry_policy
            .execute(cancel, || self.get_once(&endpoint))
            .await
    }

    async fn get_once<T>(&self, endpoint: &str) -> Result<T, GatewayError>
    where
        T: DeserializeOwned + Default,
    {
        debug!("GET {}", endpoint);

        let response = self
            .http_client
            .get(endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| network_error(endpoint, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| network_error(endpoint, e))?;

        if !status.is_success() {
            return Err(GatewayError::api(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                endpoint,
                &body,
            ));
        }

        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

fn network_error(endpoint: &str, error: reqwest::Error) -> GatewayError {
    GatewayError::Network {
        endpoint: endpoint.to_string(),
        message: error.to_string(),
        timeout: error.is_timeout(),
    }
}

fn require(value: &str, message: &str) -> Result<String, GatewayError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(GatewayError::Invalid(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl ContentGateway for CatalogClient {
    async fn get_cities(&self, cancel: &CancellationToken) -> Result<Vec<City>, GatewayError> {
        let endpoint = format!("{}/states", self.content_base_url);
        let states: Vec<State> = self.get_json(endpoint, cancel).await?;
        if states.is_empty() {
            return Err(GatewayError::Invalid("no states found".to_string()));
        }

        let cities: Vec<City> = states.into_iter().flat_map(|state| state.cities).collect();
        if cities.is_empty() {
            return Err(GatewayError::Invalid("no cities found".to_string()));
        }
        Ok(cities)
    }

    async fn get_city_by_name(&self, name: &str, cancel: &CancellationToken) -> Result<City, GatewayError> {
        let name = require(name, "city name is required")?;
        let endpoint = format!(
            "{}/states/city/name/{}",
            self.content_base_url,
            urlencoding::encode(&name)
        );

        let city: City = self.get_json(endpoint, cancel).await?;
        if city.id.is_empty() {
            return Err(GatewayError::NotFound(format!("city not found: {}", name)));
        }
        Ok(city)
    }

    async fn get_theaters(&self, city_id: &str, cancel: &CancellationToken) -> Result<Vec<Theater>, GatewayError> {
        let city_id = require(city_id, "city id is required")?;
        let endpoint = format!("{}/theaters/city/{}", self.content_base_url, city_id);
        self.get_json(endpoint, cancel).await
    }

    async fn get_sessions(
        &self,
        city_id: &str,
        theater_id: &str,
        date: Option<NaiveDate>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError> {
        let city_id = require(city_id, "city id and theater id are required")?;
        let theater_id = require(theater_id, "city id and theater id are required")?;

        let mut endpoint = format!(
            "{}/sessions/city/{}/theater/{}",
            self.content_base_url, city_id, theater_id
        );
        if let Some(date) = date {
            endpoint.push_str(&format!("?date={}", date.format("%Y-%m-%d")));
        }
        self.get_json(endpoint, cancel).await
    }

    async fn get_session_details(
        &self,
        session_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SessionDetail, GatewayError> {
        let session_id = require(session_id, "session id is required")?;
        let endpoint = format!("{}/sessions/{}", self.checkout_base_url, session_id);
        self.get_json(endpoint, cancel).await
    }

    async fn get_seat_map(
        &self,
        session_id: &str,
        section_id: &str,
        cancel: &CancellationToken,
    ) -> Result<SeatMap, GatewayError> {
        let session_id = require(session_id, "session id and section id are required")?;
        let section_id = require(section_id, "session id and section id are required")?;
        let endpoint = format!(
            "{}/sessions/{}/sections/{}/seats",
            self.checkout_base_url, session_id, section_id
        );
        self.get_json(endpoint, cancel).await
    }
}
