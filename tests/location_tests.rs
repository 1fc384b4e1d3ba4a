use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ingresso_finder::location::providers::{parse_ipapi, parse_ipinfo, parse_ipwhois};
use ingresso_finder::location::{
    LocationError, LocationProvider, LocationResolver, SystemLocationError, SystemLocator, UnsupportedSystemLocator,
    UserLocation,
};

struct FixedSystemLocator(Result<UserLocation, SystemLocationError>);

#[async_trait]
impl SystemLocator for FixedSystemLocator {
    async fn locate(&self, _cancel: &CancellationToken) -> Result<UserLocation, SystemLocationError> {
        self.0.clone()
    }
}

struct SlowSystemLocator;

#[async_trait]
impl SystemLocator for SlowSystemLocator {
    async fn locate(&self, _cancel: &CancellationToken) -> Result<UserLocation, SystemLocationError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(SystemLocationError::Failed("unreachable".into()))
    }
}

fn providers(server: &MockServer) -> Vec<LocationProvider> {
    vec![
        LocationProvider::new("ipapi", format!("{}/ipapi", server.uri()), parse_ipapi),
        LocationProvider::new("ipwhois", format!("{}/ipwhois", server.uri()), parse_ipwhois),
        LocationProvider::new("ipinfo", format!("{}/ipinfo", server.uri()), parse_ipinfo),
    ]
}

#[tokio::test]
async fn test_system_location_wins_without_network() {
    let server = MockServer::start().await;
    let system = FixedSystemLocator(Ok(UserLocation {
        latitude: -23.55,
        longitude: -46.63,
        city: "Sao Paulo".into(),
        ..Default::default()
    }));
    let resolver = LocationResolver::new(Arc::new(system), providers(&server)).unwrap();

    let location = resolver.detect_location(&CancellationToken::new()).await.unwrap();
    assert_eq!(location.source, "system");
    assert_eq!(location.coordinates(), (-23.55, -46.63));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_falls_back_through_providers_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipapi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"error": true, "reason": "RateLimited"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipwhois"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"success": true, "latitude": -22.9, "longitude": -43.2, "city": "Rio de Janeiro", "region": "RJ"}"#,
        ))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Arc::new(UnsupportedSystemLocator), providers(&server)).unwrap();
    let location = resolver.detect_location(&CancellationToken::new()).await.unwrap();

    assert_eq!(location.source, "ipwhois");
    assert_eq!(location.label(), "Rio de Janeiro, RJ (via IP (ipwhois))");
    // ipinfo is never asked
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_exhausted_error_keeps_both_causes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipapi"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<!DOCTYPE html><html><body>oops</body></html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipwhois"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success": false, "message": "Reserved range"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipinfo"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate\n   limited"))
        .mount(&server)
        .await;

    let system = FixedSystemLocator(Err(SystemLocationError::PermissionDenied));
    let resolver = LocationResolver::new(Arc::new(system), providers(&server)).unwrap();
    let error = resolver.detect_location(&CancellationToken::new()).await.unwrap_err();

    match error {
        LocationError::Exhausted { system, fallback } => {
            assert_eq!(system, "location permission denied");
            assert!(fallback.starts_with("all location providers failed ("));
            assert!(fallback.contains("ipapi: 500 Internal Server Error |"));
            assert!(!fallback.contains("DOCTYPE"));
            assert!(fallback.contains("ipwhois: Reserved range"));
            assert!(fallback.contains("ipinfo: 429 Too Many Requests: rate limited"));
        }
        other => panic!("expected exhausted error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_zero_coordinates_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipapi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"latitude": 0, "longitude": 0}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ipwhois"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"success": true, "latitude": -8.05, "longitude": -34.9, "city": "Recife"}"#,
        ))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Arc::new(UnsupportedSystemLocator), providers(&server)).unwrap();
    let location = resolver.detect_location(&CancellationToken::new()).await.unwrap();
    assert_eq!(location.city, "Recife");
}

#[tokio::test]
async fn test_system_timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ipapi"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"latitude": -15.8, "longitude": -47.9, "city": "Brasilia", "region": "DF"}"#,
        ))
        .mount(&server)
        .await;

    let resolver = LocationResolver::new(Arc::new(SlowSystemLocator), providers(&server))
        .unwrap()
        .with_system_timeout(Duration::from_millis(20));
    let location = resolver.detect_location(&CancellationToken::new()).await.unwrap();
    assert_eq!(location.source, "ipapi");
}

#[tokio::test]
async fn test_cancellation_aborts_detection() {
    let server = MockServer::start().await;
    let resolver = LocationResolver::new(Arc::new(SlowSystemLocator), providers(&server)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    assert_eq!(resolver.detect_location(&cancel).await, Err(LocationError::Cancelled));
    assert!(server.received_requests().await.unwrap().is_empty());
}
