//! Async operations issued by the browser
//!
//! Every function returns a [`Command`] that resolves to exactly one [`Msg`].
//! Each operation runs under a child of the shutdown token so quitting
//! cancels whatever is still in flight.

use std::sync::Arc;

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::api::{City, Section, Theater};
use crate::catalog::{aggregate, AggregateError, AggregateRequest};
use crate::store::RecentCity;
use crate::tui::Command;

use super::app::Services;
use super::models::CatalogFailure;
use super::Msg;

const CHECKOUT_PAGE_URL: &str = "https://checkout.ingresso.com/assentos";

/// Seat selection page for a session
pub fn checkout_url(session_id: &str) -> String {
    format!("{}?sessionId={}&partnership=home", CHECKOUT_PAGE_URL, session_id)
}

pub fn fetch_cities(services: &Services) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move { catalog.cities(&cancel).await.map_err(|e| e.to_string()) },
        Msg::CitiesLoaded,
    )
}

pub fn fetch_city_by_name(services: &Services, name: String) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            debug!("Resolving city '{}'", name);
            catalog.city_by_name(&name, &cancel).await.map_err(|e| e.to_string())
        },
        Msg::CityResolved,
    )
}

/// Resolve the most recent city from the city cache, falling back to a
/// lookup by name
pub fn fetch_recent_city(services: &Services, recent: RecentCity) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            let cached = catalog
                .cached_cities()
                .into_iter()
                .find(|city| recent_matches_cached(&recent, city));
            if let Some(city) = cached {
                debug!("Recent city '{}' resolved from cache", city.name);
                return Ok(city);
            }

            let name = recent.name.trim();
            if name.is_empty() {
                return Err("recent city not found".to_string());
            }
            catalog.city_by_name(name, &cancel).await.map_err(|e| e.to_string())
        },
        Msg::CityResolved,
    )
}

/// Looser than [`RecentCity::matches`]: an entry saved without a UF still
/// matches by name
fn recent_matches_cached(recent: &RecentCity, city: &City) -> bool {
    let id = recent.id.trim();
    if !id.is_empty() && city.id == id {
        return true;
    }
    let name = recent.name.trim();
    let uf = recent.uf.trim();
    !name.is_empty()
        && city.name.eq_ignore_ascii_case(name)
        && (uf.is_empty() || city.uf.eq_ignore_ascii_case(uf))
}

pub fn fetch_theaters(services: &Services, city_id: String) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move { catalog.theaters(&city_id, &cancel).await.map_err(|e| e.to_string()) },
        Msg::TheatersLoaded,
    )
}

/// Sessions of one theater. A theater without programme answers 404, which
/// is reported as an empty list.
pub fn fetch_sessions(services: &Services, city_id: String, theater_id: String, date: NaiveDate) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            match catalog.session_days(&city_id, &theater_id, date, &cancel).await {
                Ok(days) => Ok(days),
                Err(e) if e.is_not_found() => Ok(Vec::new()),
                Err(e) => Err(e.to_string()),
            }
        },
        Msg::SessionsLoaded,
    )
}

pub fn fetch_movie_catalog(
    services: &Services,
    city_id: String,
    theaters: Vec<Theater>,
    date: NaiveDate,
    origin: Option<(f64, f64)>,
) -> Command<Msg> {
    let source = Arc::new(services.catalog.clone());
    let cancel = services.shutdown.child_token();
    let request = AggregateRequest {
        city_id,
        theaters,
        date,
        origin,
        concurrency: services.concurrency,
    };
    Command::perform(
        async move {
            aggregate(source, request, &cancel).await.map_err(|e| {
                let suggest_next_day = matches!(e, AggregateError::NoSessions { .. });
                CatalogFailure {
                    message: e.to_string(),
                    suggest_next_day,
                }
            })
        },
        Msg::CatalogLoaded,
    )
}

pub fn detect_location(services: &Services) -> Command<Msg> {
    let location = services.location.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            location
                .detect_location(&cancel)
                .await
                .map_err(|e| format!("failed to detect current location: {}", e))
        },
        Msg::LocationDetected,
    )
}

pub fn fetch_session_details(services: &Services, session_id: String) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            catalog
                .session_details(&session_id, &cancel)
                .await
                .map_err(|e| e.to_string())
        },
        Msg::SessionDetailsLoaded,
    )
}

pub fn fetch_seat_map(services: &Services, session_id: String, section: Section) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            let result = catalog
                .seat_map(&session_id, &section.id, &cancel)
                .await
                .map_err(|e| e.to_string());
            (section, result)
        },
        |(section, result)| Msg::SeatMapLoaded(section, result),
    )
}

pub fn fetch_seat_count(services: &Services, session_id: String) -> Command<Msg> {
    let catalog = services.catalog.clone();
    let cancel = services.shutdown.child_token();
    Command::perform(
        async move {
            let result = catalog.seat_count(&session_id, &cancel).await.map_err(|e| {
                warn!("Seat count for session {} failed: {}", session_id, e);
                e.to_string()
            });
            (session_id, result)
        },
        |(session_id, result)| Msg::SeatCountLoaded(session_id, result),
    )
}

pub fn open_checkout(session_id: &str) -> Command<Msg> {
    let url = checkout_url(session_id);
    info!("Opening checkout {}", url);
    Command::perform(open_in_browser(url), Msg::BrowserOpened)
}

async fn open_in_browser(url: String) -> Result<(), String> {
    let mut command = if cfg!(target_os = "macos") {
        let mut command = tokio::process::Command::new("open");
        command.arg(&url);
        command
    } else if cfg!(target_os = "windows") {
        let mut command = tokio::process::Command::new("rundll32");
        command.args(["url.dll,FileProtocolHandler", url.as_str()]);
        command
    } else {
        let mut command = tokio::process::Command::new("xdg-open");
        command.arg(&url);
        command
    };

    // The launcher is left running; only a failure to start it is reported
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map(|_child| ())
        .map_err(|e| format!("failed to open browser: {}", e))
}
