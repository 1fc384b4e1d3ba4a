//! Access to the Ingresso catalog: models, the gateway trait and its HTTP client

pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resilience;

pub use client::{CatalogClient, ClientConfig, CHECKOUT_BASE_URL, CONTENT_BASE_URL, DEFAULT_USER_AGENT};
pub use error::{ErrorKind, GatewayError};
pub use gateway::ContentGateway;
pub use models::*;
pub use resilience::{RetryConfig, RetryPolicy, RetryableError};
