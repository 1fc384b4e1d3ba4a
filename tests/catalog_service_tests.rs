use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;

use ingresso_finder::api::{
    City, ContentGateway, GatewayError, Movie, Room, Seat, SeatLine, SeatMap, Section, Session, SessionDay,
    SessionDetail, Theater,
};
use ingresso_finder::catalog::CatalogService;
use ingresso_finder::store::{CacheEnvelope, Store};

#[derive(Default)]
struct CountingGateway {
    cities: AtomicUsize,
    theaters: AtomicUsize,
    sessions: AtomicUsize,
    empty_first_programme: bool,
    fail_seat_map: bool,
}

#[async_trait]
impl ContentGateway for CountingGateway {
    async fn get_cities(&self, _cancel: &CancellationToken) -> Result<Vec<City>, GatewayError> {
        self.cities.fetch_add(1, Ordering::SeqCst);
        Ok(vec![City {
            id: "1".into(),
            name: "Recife".into(),
            uf: "PE".into(),
            ..Default::default()
        }])
    }

    async fn get_city_by_name(&self, name: &str, _cancel: &CancellationToken) -> Result<City, GatewayError> {
        Err(GatewayError::NotFound(name.to_string()))
    }

    async fn get_theaters(&self, _city_id: &str, _cancel: &CancellationToken) -> Result<Vec<Theater>, GatewayError> {
        let calls = self.theaters.fetch_add(1, Ordering::SeqCst);
        // First answer is empty so it never counts as a usable cache entry
        if calls == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![Theater {
            id: "t1".into(),
            name: "Cinema São Luiz".into(),
            ..Default::default()
        }])
    }

    async fn get_sessions(
        &self,
        _city_id: &str,
        _theater_id: &str,
        date: Option<NaiveDate>,
        _cancel: &CancellationToken,
    ) -> Result<Vec<SessionDay>, GatewayError> {
        let calls = self.sessions.fetch_add(1, Ordering::SeqCst);
        if self.empty_first_programme && calls == 0 {
            return Ok(Vec::new());
        }
        Ok(vec![SessionDay {
            date: date.map(|date| date.to_string()).unwrap_or_default(),
            movies: vec![Movie {
                title: "Bacurau".into(),
                rooms: vec![Room {
                    name: "Sala 1".into(),
                    sessions: vec![Session {
                        id: "s1".into(),
                        ..Default::default()
                    }],
                }],
                ..Default::default()
            }],
            ..Default::default()
        }])
    }

    async fn get_session_details(
        &self,
        session_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<SessionDetail, GatewayError> {
        let section = |id: &str, seats: bool| Section {
            id: id.into(),
            name: id.into(),
            has_seat_selection: seats,
            ..Default::default()
        };
        Ok(SessionDetail {
            id: session_id.into(),
            sections: vec![section("A", true), section("B", true), section("standing", false)],
            ..Default::default()
        })
    }

    async fn get_seat_map(
        &self,
        _session_id: &str,
        section_id: &str,
        _cancel: &CancellationToken,
    ) -> Result<SeatMap, GatewayError> {
        if self.fail_seat_map && section_id == "B" {
            return Err(GatewayError::api(500, "Internal Server Error", "/seats", b""));
        }
        let seat = |column: i32, status: &str| Seat {
            status: status.into(),
            line: 1,
            column,
            ..Default::default()
        };
        Ok(SeatMap {
            lines: vec![SeatLine {
                line: 1,
                seats: vec![seat(1, "Available"), seat(2, "Available"), seat(3, "Occupied")],
            }],
            ..Default::default()
        })
    }
}

fn service(gateway: Arc<CountingGateway>, dir: &tempfile::TempDir) -> CatalogService {
    let store = Store::new(dir.path().join("cache"), dir.path().join("config"));
    CatalogService::new(gateway, store)
}

#[tokio::test]
async fn test_cities_are_served_from_cache_after_first_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(CountingGateway::default());
    let service = service(gateway.clone(), &dir);
    let cancel = CancellationToken::new();

    let first = service.cities(&cancel).await.unwrap();
    let second = service.cities(&cancel).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gateway.cities.load(Ordering::SeqCst), 1);
    assert_eq!(service.cached_cities()[0].name, "Recife");
}

#[tokio::test]
async fn test_stale_city_cache_is_refreshed() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    let stale = CacheEnvelope {
        updated_at: Utc::now() - Duration::days(8),
        data: vec![City {
            id: "9".into(),
            name: "Olinda".into(),
            ..Default::default()
        }],
    };
    std::fs::write(cache_dir.join("cities.json"), serde_json::to_vec(&stale).unwrap()).unwrap();

    let gateway = Arc::new(CountingGateway::default());
    let service = service(gateway.clone(), &dir);
    // Stale data is still offered for name matching
    assert_eq!(service.cached_cities()[0].name, "Olinda");

    let cities = service.cities(&CancellationToken::new()).await.unwrap();
    assert_eq!(cities[0].name, "Recife");
    assert_eq!(gateway.cities.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_corrupt_cache_counts_as_miss() {
    let dir = tempfile::tempdir().unwrap();
    let cache_dir = dir.path().join("cache");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("cities.json"), b"{ not json").unwrap();

    let gateway = Arc::new(CountingGateway::default());
    let service = service(gateway.clone(), &dir);

    let cities = service.cities(&CancellationToken::new()).await.unwrap();
    assert_eq!(cities.len(), 1);
    assert_eq!(gateway.cities.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_theater_list_is_not_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(CountingGateway::default());
    let service = service(gateway.clone(), &dir);
    let cancel = CancellationToken::new();

    assert!(service.theaters("1", &cancel).await.unwrap().is_empty());
    assert_eq!(service.theaters("1", &cancel).await.unwrap().len(), 1);
    assert_eq!(service.theaters("1", &cancel).await.unwrap().len(), 1);
    assert_eq!(gateway.theaters.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_empty_programme_is_not_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(CountingGateway {
        empty_first_programme: true,
        ..Default::default()
    });
    let service = service(gateway.clone(), &dir);
    let cancel = CancellationToken::new();
    let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    assert!(service.session_days("1", "t1", day, &cancel).await.unwrap().is_empty());
    assert!(!dir.path().join("cache").join("sessions_1_t1_2025-03-01.json").exists());

    let days = service.session_days("1", "t1", day, &cancel).await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].movies[0].title, "Bacurau");
    assert_eq!(gateway.sessions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_sessions_are_cached_per_date() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(CountingGateway::default());
    let service = service(gateway.clone(), &dir);
    let cancel = CancellationToken::new();
    let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    service.session_days("1", "t1", day, &cancel).await.unwrap();
    service.session_days("1", "t1", day, &cancel).await.unwrap();
    let next = service
        .session_days("1", "t1", day.succ_opt().unwrap(), &cancel)
        .await
        .unwrap();

    assert_eq!(next[0].date, "2025-03-02");
    assert_eq!(gateway.sessions.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_seat_count_totals_seat_selling_sections() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(Arc::new(CountingGateway::default()), &dir);

    let count = service.seat_count("s1", &CancellationToken::new()).await.unwrap();
    assert_eq!(count.total, 6);
    assert_eq!(count.available, 4);
    assert_eq!(count.occupied, 2);
    assert_eq!(count.pair_available, 2);
}

#[tokio::test]
async fn test_seat_count_fails_when_any_section_fails() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = Arc::new(CountingGateway {
        fail_seat_map: true,
        ..Default::default()
    });
    let service = service(gateway, &dir);

    let error = service.seat_count("s1", &CancellationToken::new()).await.unwrap_err();
    assert_eq!(error.status(), Some(500));
}
