//! IP geolocation providers
//!
//! Each provider answers with its own JSON shape and its own way of
//! signalling failure; the parsers normalise both into [`UserLocation`].

use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::UserLocation;

pub const IPAPI_ENDPOINT: &str = "https://ipapi.co/json/";
pub const IPWHOIS_ENDPOINT: &str = "https://ipwho.is/";
pub const IPINFO_ENDPOINT: &str = "https://ipinfo.io/json";

const ERROR_SNIPPET_CHARS: usize = 120;
const ERROR_BODY_LIMIT: usize = 4 * 1024;
const BODY_LIMIT: usize = 64 * 1024;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("{0}")]
    Failed(String),

    #[error("operation cancelled")]
    Cancelled,
}

fn failed(message: impl Into<String>) -> ProviderError {
    ProviderError::Failed(message.into())
}

pub type ParseFn = fn(&[u8]) -> Result<UserLocation, ProviderError>;

#[derive(Debug, Clone)]
pub struct LocationProvider {
    pub name: String,
    pub endpoint: String,
    pub parse: ParseFn,
}

impl LocationProvider {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, parse: ParseFn) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            parse,
        }
    }

    pub fn ipapi() -> Self {
        Self::new("ipapi", IPAPI_ENDPOINT, parse_ipapi)
    }

    pub fn ipwhois() -> Self {
        Self::new("ipwhois", IPWHOIS_ENDPOINT, parse_ipwhois)
    }

    pub fn ipinfo() -> Self {
        Self::new("ipinfo", IPINFO_ENDPOINT, parse_ipinfo)
    }

    /// ipapi, then ipwhois, then ipinfo
    pub fn defaults() -> Vec<Self> {
        vec![Self::ipapi(), Self::ipwhois(), Self::ipinfo()]
    }

    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        cancel: &CancellationToken,
    ) -> Result<UserLocation, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.fetch_once(client) => result,
        }
    }

    async fn fetch_once(&self, client: &reqwest::Client) -> Result<UserLocation, ProviderError> {
        let response = client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| failed(format!("location request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| failed(format!("read location response: {}", e)))?;

        if !status.is_success() {
            let limit = body.len().min(ERROR_BODY_LIMIT);
            let snippet = compact_error_snippet(&String::from_utf8_lossy(&body[..limit]));
            return Err(if snippet.is_empty() {
                failed(status.to_string())
            } else {
                failed(format!("{}: {}", status, snippet))
            });
        }

        let limit = body.len().min(BODY_LIMIT);
        let mut location = (self.parse)(&body[..limit])?;
        if location.latitude == 0.0 && location.longitude == 0.0 {
            return Err(failed("provider returned empty coordinates"));
        }
        if location.source.trim().is_empty() {
            location.source = self.name.trim().to_string();
        }
        Ok(location)
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|e| failed(format!("decode location response: {}", e)))
}

pub fn parse_ipapi(body: &[u8]) -> Result<UserLocation, ProviderError> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Payload {
        latitude: f64,
        longitude: f64,
        city: String,
        region: String,
        country_name: String,
        error: bool,
        reason: String,
    }

    let payload: Payload = decode(body)?;
    if payload.error {
        let reason = if payload.reason.is_empty() { "unknown error".to_string() } else { payload.reason };
        return Err(failed(reason));
    }

    Ok(UserLocation {
        latitude: payload.latitude,
        longitude: payload.longitude,
        city: payload.city,
        region: payload.region,
        country: payload.country_name,
        source: String::new(),
    })
}

pub fn parse_ipwhois(body: &[u8]) -> Result<UserLocation, ProviderError> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Payload {
        success: bool,
        message: String,
        latitude: f64,
        longitude: f64,
        city: String,
        region: String,
        country: String,
    }

    let payload: Payload = decode(body)?;
    if !payload.success {
        let message = if payload.message.trim().is_empty() {
            "provider returned unsuccessful response".to_string()
        } else {
            payload.message
        };
        return Err(failed(message));
    }

    Ok(UserLocation {
        latitude: payload.latitude,
        longitude: payload.longitude,
        city: payload.city,
        region: payload.region,
        country: payload.country,
        source: String::new(),
    })
}

pub fn parse_ipinfo(body: &[u8]) -> Result<UserLocation, ProviderError> {
    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct ErrorBody {
        message: String,
    }

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Payload {
        loc: String,
        city: String,
        region: String,
        country: String,
        bogon: bool,
        error: ErrorBody,
    }

    let payload: Payload = decode(body)?;
    if payload.bogon {
        return Err(failed("bogon IP"));
    }
    if !payload.error.message.is_empty() {
        return Err(failed(payload.error.message));
    }

    let (lat, lng) = payload
        .loc
        .trim()
        .split_once(',')
        .ok_or_else(|| failed("provider did not return valid loc"))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|e| failed(format!("parse latitude: {}", e)))?;
    let longitude: f64 = lng
        .trim()
        .parse()
        .map_err(|e| failed(format!("parse longitude: {}", e)))?;

    Ok(UserLocation {
        latitude,
        longitude,
        city: payload.city,
        region: payload.region,
        country: payload.country,
        source: String::new(),
    })
}

/// One-line summary of an error body. HTML pages are dropped entirely.
pub fn compact_error_snippet(raw: &str) -> String {
    let text = raw.trim();
    if text.is_empty() {
        return String::new();
    }
    let lower = text.to_lowercase();
    if lower.contains("<html") || lower.contains("<!doctype") {
        return String::new();
    }
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    single_line.chars().take(ERROR_SNIPPET_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipapi() {
        let body = br#"{"latitude":-23.5,"longitude":-46.6,"city":"Sao Paulo","region":"SP","country_name":"Brazil"}"#;
        let location = parse_ipapi(body).unwrap();
        assert_eq!(location.city, "Sao Paulo");
        assert_eq!(location.country, "Brazil");

        let err = parse_ipapi(br#"{"error":true,"reason":"RateLimited"}"#).unwrap_err();
        assert_eq!(err.to_string(), "RateLimited");
    }

    #[test]
    fn test_parse_ipwhois_unsuccessful() {
        let err = parse_ipwhois(br#"{"success":false,"message":"Reserved range"}"#).unwrap_err();
        assert_eq!(err.to_string(), "Reserved range");

        let err = parse_ipwhois(br#"{"success":false}"#).unwrap_err();
        assert_eq!(err.to_string(), "provider returned unsuccessful response");
    }

    #[test]
    fn test_parse_ipinfo_loc() {
        let location = parse_ipinfo(br#"{"loc":"-22.9068, -43.1729","city":"Rio"}"#).unwrap();
        assert_eq!(location.latitude, -22.9068);
        assert_eq!(location.longitude, -43.1729);

        assert_eq!(parse_ipinfo(br#"{"bogon":true}"#).unwrap_err().to_string(), "bogon IP");
        assert_eq!(
            parse_ipinfo(br#"{"loc":"nowhere"}"#).unwrap_err().to_string(),
            "provider did not return valid loc"
        );
        assert_eq!(
            parse_ipinfo(br#"{"error":{"title":"x","message":"Wrong token"}}"#).unwrap_err().to_string(),
            "Wrong token"
        );
    }

    #[test]
    fn test_compact_error_snippet() {
        assert_eq!(compact_error_snippet("  <!DOCTYPE html><html>oops</html> "), "");
        assert_eq!(compact_error_snippet("rate\n  limited\tnow"), "rate limited now");
        assert_eq!(compact_error_snippet(&"x".repeat(500)).len(), 120);
    }
}
