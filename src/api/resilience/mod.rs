//! Resilience layer for catalog requests

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryableError};
