use log::{info, warn};

use crate::location::UserLocation;
use crate::tui::Command;

use super::super::app::State;
use super::super::fetch;
use super::super::items::{build_theater_items, build_visibility_items};
use super::super::models::Screen;
use super::super::Msg;
use super::navigation::fail;

/// Rebuild the theater picker and the visibility manager from the current
/// theaters, hidden set and location
pub fn refresh_theater_lists(state: &mut State) {
    let recents = match state.services.catalog.store().load_recent_theaters() {
        Ok(recents) => recents,
        Err(e) => {
            warn!("Ignoring unreadable theater history: {}", e);
            Vec::new()
        }
    };
    let city_id = state.city_id();
    let origin = state.origin();

    state.theater_list.set_items(build_theater_items(
        &state.theaters,
        &city_id,
        &state.hidden_theaters,
        &recents,
        origin,
    ));
    state
        .visibility_list
        .set_items(build_visibility_items(&state.theaters, &state.hidden_theaters, origin));
}

pub fn handle_browse_all(state: &mut State) -> Command<Msg> {
    if !matches!(state.screen, Screen::SelectTheater) {
        return Command::None;
    }
    state.theater = None;
    start_catalog_fetch(state)
}

/// Aggregate the programme of every visible theater for the current date
pub fn start_catalog_fetch(state: &mut State) -> Command<Msg> {
    let visible = state.visible_theaters();
    if visible.is_empty() {
        return fail(state, "no visible theaters selected", Some(Screen::SelectTheater), false);
    }

    info!("Browsing {} theaters on {}", visible.len(), state.date);
    state.cross_theater = true;
    state.screen = Screen::LoadingSessions;
    fetch::fetch_movie_catalog(&state.services, state.city_id(), visible, state.date, state.origin())
}

pub fn handle_manage(state: &mut State) -> Command<Msg> {
    if !matches!(state.screen, Screen::SelectTheater) {
        return Command::None;
    }
    refresh_theater_lists(state);
    state.screen = Screen::ManageTheaters;
    Command::None
}

/// Flip the hidden flag of the highlighted theater in the visibility manager
pub fn toggle_visibility(state: &mut State) -> Command<Msg> {
    let Some(item) = state.visibility_list.selected_item() else {
        return Command::None;
    };
    let theater_id = item.theater.id.clone();
    let hidden = !item.hidden;

    let city_id = state.city_id();
    if let Err(e) = state
        .services
        .catalog
        .store()
        .set_theater_hidden(&city_id, &theater_id, hidden)
    {
        return fail(state, e.to_string(), None, false);
    }
    info!("Theater {} {}", theater_id, if hidden { "hidden" } else { "visible" });

    if hidden {
        state.hidden_theaters.insert(theater_id.clone());
    } else {
        state.hidden_theaters.remove(&theater_id);
    }
    if hidden && state.theater.as_ref().is_some_and(|theater| theater.id == theater_id) {
        state.theater = None;
    }

    let index = state.visibility_list.selected_index().unwrap_or(0);
    refresh_theater_lists(state);
    state.visibility_list.select(index);
    Command::None
}

pub fn handle_detect_location(state: &mut State) -> Command<Msg> {
    if !matches!(state.screen, Screen::SelectTheater | Screen::ManageTheaters) {
        return Command::None;
    }
    info!("Detecting location");
    fetch::detect_location(&state.services)
}

pub fn handle_location_detected(state: &mut State, result: Result<UserLocation, String>) -> Command<Msg> {
    match result {
        Ok(location) => {
            info!("Location detected: {}", location.label());
            state.location = Some(location);
            refresh_theater_lists(state);
            Command::None
        }
        // Detection runs in the background; only interrupt the theater screens
        Err(e) if matches!(state.screen, Screen::SelectTheater | Screen::ManageTheaters) => fail(state, e, None, false),
        Err(e) => {
            warn!("Location detection finished after leaving the theater list: {}", e);
            Command::None
        }
    }
}
