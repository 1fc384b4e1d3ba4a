//! Interactive browser: city → theater → movie → session → seat map

mod app;
mod fetch;
mod items;
mod models;
mod update;
mod view;


pub use app::{BrowserApp, BrowserParams, Services, State as BrowserState};
pub use fetch::checkout_url;
pub use models::{CatalogFailure, CatalogSummary, FetchKind, Screen, SeatCountState};

use crossterm::event::KeyCode;

use crate::api::{City, SeatMap, Section, SessionDay, SessionDetail, Theater};
use crate::catalog::{MovieCatalog, SeatCount};
use crate::location::UserLocation;

#[derive(Clone, Debug)]
pub enum Msg {
    // Focused list
    FilterInput(String),
    FilterBackspace,
    ListNavigate(KeyCode),

    // Terminal
    Resized(u16, u16),
    Tick,

    // Navigation
    Confirm,
    Back,
    Quit,
    OpenDatePicker,
    NextDay,

    // Theaters
    BrowseAllTheaters,
    ManageTheaters,
    DetectLocation,

    // Sessions and seat map
    OpenSeatMap,
    ToggleSeatNumbers,

    // Async results
    CitiesLoaded(Result<Vec<City>, String>),
    CityResolved(Result<City, String>),
    TheatersLoaded(Result<Vec<Theater>, String>),
    SessionsLoaded(Result<Vec<SessionDay>, String>),
    CatalogLoaded(Result<MovieCatalog, CatalogFailure>),
    LocationDetected(Result<UserLocation, String>),
    SessionDetailsLoaded(Result<SessionDetail, String>),
    SeatMapLoaded(Section, Result<SeatMap, String>),
    SeatCountLoaded(String, Result<SeatCount, String>),
    BrowserOpened(Result<(), String>),
}
