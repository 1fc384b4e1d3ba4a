use log::{debug, info, warn};

use crate::api::{City, SeatMap, Section, SessionDay, SessionDetail, Theater};
use crate::catalog::aggregate::select_day;
use crate::catalog::MovieCatalog;
use crate::tui::Command;

use super::super::app::State;
use super::super::fetch;
use super::super::items::{build_catalog_items, build_city_items, build_movie_items, build_section_items};
use super::super::models::{CatalogFailure, CatalogSummary, Screen};
use super::super::Msg;
use super::navigation::{fail, select_city};
use super::theaters::refresh_theater_lists;

/// Whether a result is still wanted. Results that land after the user moved
/// on are dropped.
fn awaiting(state: &State, expected: Screen, what: &str) -> bool {
    if state.screen == expected {
        return true;
    }
    debug!("Dropping late {} result", what);
    false
}

pub fn handle_cities_loaded(state: &mut State, result: Result<Vec<City>, String>) -> Command<Msg> {
    if !awaiting(state, Screen::LoadingCities, "city list") {
        return Command::None;
    }
    let cities = match result {
        Ok(cities) => cities,
        Err(e) => return fail(state, e, None, false),
    };
    info!("Loaded {} cities", cities.len());

    let recents = match state.services.catalog.store().load_recent_cities() {
        Ok(recents) => recents,
        Err(e) => {
            warn!("Ignoring unreadable city history: {}", e);
            Vec::new()
        }
    };
    state.city_list.set_items(build_city_items(&cities, &recents));
    state.cities = cities;
    state.screen = Screen::SelectCity;
    Command::None
}

/// A city resolved at startup. When it cannot be resolved the full list is
/// offered instead.
pub fn handle_city_resolved(state: &mut State, result: Result<City, String>) -> Command<Msg> {
    if !awaiting(state, Screen::LoadingCities, "startup city") {
        return Command::None;
    }
    match result {
        Ok(city) => select_city(state, city),
        Err(e) => {
            warn!("Could not resolve startup city, loading the city list: {}", e);
            state.screen = Screen::LoadingCities;
            fetch::fetch_cities(&state.services)
        }
    }
}

pub fn handle_theaters_loaded(state: &mut State, result: Result<Vec<Theater>, String>) -> Command<Msg> {
    if !awaiting(state, Screen::LoadingTheaters, "theater list") {
        return Command::None;
    }
    let theaters = match result {
        Ok(theaters) => theaters,
        Err(e) => return fail(state, e, None, false),
    };

    let city_id = state.city_id();
    let hidden = match state.services.catalog.store().load_hidden_theaters(&city_id) {
        Ok(hidden) => hidden,
        Err(e) => return fail(state, e.to_string(), None, false),
    };
    info!("Loaded {} theaters for city {} ({} hidden)", theaters.len(), city_id, hidden.len());

    state.theaters = theaters;
    state.hidden_theaters = hidden;
    refresh_theater_lists(state);
    state.theater_list.select(0);
    state.screen = Screen::SelectTheater;
    Command::None
}

pub fn handle_sessions_loaded(state: &mut State, result: Result<Vec<SessionDay>, String>) -> Command<Msg> {
    if state.cross_theater || !awaiting(state, Screen::LoadingSessions, "theater sessions") {
        return Command::None;
    }
    let days = match result {
        Ok(days) => days,
        Err(e) => return fail(state, e, Some(Screen::SelectTheater), false),
    };
    if days.is_empty() {
        let message = format!("no sessions found for this theater on {}", state.date.format("%Y-%m-%d"));
        return fail(state, message, Some(Screen::SelectTheater), true);
    }

    let items = build_movie_items(select_day(&days, state.date));
    info!("Loaded {} movies for {}", items.len(), state.date);

    state.cross_theater = false;
    state.catalog_summary = CatalogSummary::default();
    state.movie_list.set_title("Select Movie");
    state.movie_list.reset_filter();
    state.movie_list.set_items(items);
    state.movie_list.select(0);
    state.screen = Screen::SelectMovie { cross_theater: false };
    Command::None
}

pub fn handle_catalog_loaded(state: &mut State, result: Result<MovieCatalog, CatalogFailure>) -> Command<Msg> {
    if !state.cross_theater || !awaiting(state, Screen::LoadingSessions, "cross-theater catalog") {
        return Command::None;
    }
    let catalog = match result {
        Ok(catalog) => catalog,
        Err(failure) => {
            return fail(state, failure.message, Some(Screen::SelectTheater), failure.suggest_next_day);
        }
    };
    info!(
        "Catalog ready: {} movies ({} theaters failed, {} without sessions)",
        catalog.movies.len(),
        catalog.failed,
        catalog.ignored
    );

    state.cross_theater = true;
    state.catalog_summary = CatalogSummary {
        failed: catalog.failed,
        ignored: catalog.ignored,
    };
    state.movie_list.set_title("Select Movie • All Theaters");
    state.movie_list.reset_filter();
    state.movie_list.set_items(build_catalog_items(&catalog));
    state.movie_list.select(0);
    state.screen = Screen::SelectMovie { cross_theater: true };
    Command::None
}

pub fn handle_session_details_loaded(state: &mut State, result: Result<SessionDetail, String>) -> Command<Msg> {
    let Screen::LoadingSeatMap { session } = &state.screen else {
        return Command::None;
    };
    let session = session.clone();

    let detail = match result {
        Ok(detail) => detail,
        Err(e) => return fail(state, e, None, false),
    };

    let mut sections = detail.seat_sections();
    match sections.len() {
        0 => fail(state, "no seat map available for this session", None, false),
        1 => {
            let section = sections.remove(0);
            fetch::fetch_seat_map(&state.services, session.id, section)
        }
        _ => {
            state.section_list.reset_filter();
            state.section_list.set_items(build_section_items(sections));
            state.section_list.select(0);
            state.screen = Screen::SelectSection { session };
            Command::None
        }
    }
}

pub fn handle_seat_map_loaded(state: &mut State, section: Section, result: Result<SeatMap, String>) -> Command<Msg> {
    let Screen::LoadingSeatMap { session } = &state.screen else {
        return Command::None;
    };
    let session = session.clone();

    match result {
        Ok(seat_map) => {
            info!("Seat map loaded for session {} section {}", session.id, section.name);
            state.screen = Screen::ShowSeatMap {
                session,
                section,
                seat_map,
            };
            Command::None
        }
        Err(e) => fail(state, e, None, false),
    }
}

pub fn handle_browser_opened(state: &mut State, result: Result<(), String>) -> Command<Msg> {
    match result {
        Ok(()) => Command::None,
        Err(e) => fail(state, e, None, false),
    }
}
