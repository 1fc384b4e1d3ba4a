use log::{info, warn};

use crate::api::{City, Session};
use crate::tui::Command;

use super::super::app::State;
use super::super::fetch;
use super::super::items::{build_date_items, build_global_session_items, build_session_items};
use super::super::models::{FetchKind, Screen};
use super::super::Msg;
use super::{seat_counts, theaters};

/// Rows taken by the header and the list chrome
const LIST_CHROME_ROWS: u16 = 6;
const MIN_LIST_ROWS: u16 = 6;
/// Each list entry renders as a title line and a description line
const ROWS_PER_ITEM: u16 = 2;

/// Switch to the error screen. Without an explicit recovery target the
/// screen that failed decides where esc leads.
pub fn fail(
    state: &mut State,
    message: impl Into<String>,
    recover_to: Option<Screen>,
    suggest_next_day: bool,
) -> Command<Msg> {
    let message = message.into();
    warn!("{}", message);
    let recover_to = recover_to.unwrap_or_else(|| recovery_target(state));
    state.screen = Screen::Error {
        message,
        recover_to: Box::new(recover_to),
        suggest_next_day,
    };
    Command::None
}

fn recovery_target(state: &State) -> Screen {
    match &state.screen {
        Screen::LoadingCities | Screen::LoadingTheaters => Screen::SelectCity,
        Screen::LoadingSessions | Screen::Error { .. } => Screen::SelectTheater,
        Screen::LoadingSeatMap { .. } => state.sessions_screen(),
        other => other.clone(),
    }
}

pub fn handle_resize(state: &mut State, width: u16, height: u16) -> Command<Msg> {
    state.width = width;
    state.height = height;

    let list_rows = height.saturating_sub(LIST_CHROME_ROWS).max(MIN_LIST_ROWS);
    let items_per_page = usize::from((list_rows / ROWS_PER_ITEM).max(1));
    state.city_list.set_viewport_height(items_per_page);
    state.theater_list.set_viewport_height(items_per_page);
    state.visibility_list.set_viewport_height(items_per_page);
    state.movie_list.set_viewport_height(items_per_page);
    state.session_list.set_viewport_height(items_per_page);
    state.section_list.set_viewport_height(items_per_page);
    state.date_list.set_viewport_height(items_per_page);

    seat_counts::request_visible(state)
}

pub fn handle_tick(state: &mut State) -> Command<Msg> {
    if state.screen.is_loading() {
        state.spinner_frame = state.spinner_frame.wrapping_add(1);
    }
    Command::None
}

pub fn handle_quit(state: &mut State) -> Command<Msg> {
    info!("Quit requested");
    state.services.shutdown.cancel();
    Command::Quit
}

pub fn handle_back(state: &mut State) -> Command<Msg> {
    if let Some(list) = state.active_list_mut() {
        if list.is_filtered() {
            list.reset_filter();
            return seat_counts::request_visible(state);
        }
    }

    if matches!(state.screen, Screen::SelectTheater) && state.city_list.is_empty() {
        state.screen = Screen::LoadingCities;
        return fetch::fetch_cities(&state.services);
    }

    let target = match &state.screen {
        Screen::SelectTheater => Screen::SelectCity,
        Screen::SelectMovie { .. } | Screen::ManageTheaters => Screen::SelectTheater,
        Screen::ShowSessions { .. } => Screen::SelectMovie {
            cross_theater: state.cross_theater,
        },
        Screen::SelectSection { .. } | Screen::ShowSeatMap { .. } => state.sessions_screen(),
        Screen::SelectDate { return_to } => (**return_to).clone(),
        Screen::Error { recover_to, .. } => (**recover_to).clone(),
        _ => return Command::None,
    };
    state.screen = target;
    seat_counts::request_visible(state)
}

pub fn handle_confirm(state: &mut State) -> Command<Msg> {
    match &state.screen {
        Screen::SelectCity => confirm_city(state),
        Screen::SelectTheater => confirm_theater(state),
        Screen::ManageTheaters => theaters::toggle_visibility(state),
        Screen::SelectMovie { .. } => confirm_movie(state),
        Screen::ShowSessions { .. } => confirm_session(state),
        Screen::SelectSection { session } => {
            let session = session.clone();
            confirm_section(state, session)
        }
        Screen::SelectDate { return_to } => {
            let return_to = (**return_to).clone();
            confirm_date(state, return_to)
        }
        Screen::Error {
            suggest_next_day: true,
            ..
        } => handle_next_day(state),
        _ => Command::None,
    }
}

fn confirm_city(state: &mut State) -> Command<Msg> {
    match state.city_list.selected_item() {
        Some(item) => {
            let city = item.city.clone();
            select_city(state, city)
        }
        None => Command::None,
    }
}

/// Remember the city and load its theaters
pub fn select_city(state: &mut State, city: City) -> Command<Msg> {
    if let Err(e) = state.services.catalog.store().remember_city(&city) {
        warn!("Failed to remember city {}: {}", city.name, e);
    }
    info!("City selected: {} ({})", city.name, city.id);

    let city_id = city.id.clone();
    state.city = Some(city);
    state.theater = None;
    state.cross_theater = false;
    state.screen = Screen::LoadingTheaters;
    fetch::fetch_theaters(&state.services, city_id)
}

fn confirm_theater(state: &mut State) -> Command<Msg> {
    let Some(theater) = state.theater_list.selected_item().map(|item| item.theater.clone()) else {
        return Command::None;
    };
    let city_id = state.city_id();
    if let Err(e) = state.services.catalog.store().remember_theater(&city_id, &theater) {
        warn!("Failed to remember theater {}: {}", theater.name, e);
    }
    info!("Theater selected: {} ({})", theater.name, theater.id);

    let theater_id = theater.id.clone();
    state.theater = Some(theater);
    state.cross_theater = false;
    state.screen = Screen::LoadingSessions;
    fetch::fetch_sessions(&state.services, city_id, theater_id, state.date)
}

fn confirm_movie(state: &mut State) -> Command<Msg> {
    let Some(item) = state.movie_list.selected_item() else {
        return Command::None;
    };
    let title = item.movie.title.clone();
    let items = if item.sessions.is_empty() {
        build_session_items(&item.movie, &state.seat_counts)
    } else {
        build_global_session_items(&item.sessions, &state.seat_counts)
    };

    state.session_list.set_title(format!("Sessions • {}", title));
    state.session_list.reset_filter();
    state.session_list.set_items(items);
    state.session_list.select(0);
    state.selected_movie = Some(title.clone());
    state.screen = Screen::ShowSessions { movie: title };
    seat_counts::request_visible(state)
}

fn confirm_session(state: &mut State) -> Command<Msg> {
    match state.session_list.selected_item() {
        Some(item) => fetch::open_checkout(&item.session.id),
        None => Command::None,
    }
}

fn confirm_section(state: &mut State, session: Session) -> Command<Msg> {
    let Some(section) = state.section_list.selected_item().map(|item| item.section.clone()) else {
        return Command::None;
    };
    let session_id = session.id.clone();
    state.screen = Screen::LoadingSeatMap { session };
    fetch::fetch_seat_map(&state.services, session_id, section)
}

pub fn handle_open_date_picker(state: &mut State) -> Command<Msg> {
    let allowed = match &state.screen {
        Screen::SelectCity | Screen::SelectTheater | Screen::SelectMovie { .. } | Screen::ShowSessions { .. } => true,
        Screen::Error { suggest_next_day, .. } => *suggest_next_day,
        _ => false,
    };
    if !allowed {
        return Command::None;
    }

    let return_to = Box::new(state.screen.clone());
    state.date_list.set_items(build_date_items(state.date, state.today));
    state.date_list.select(0);
    state.screen = Screen::SelectDate { return_to };
    Command::None
}

fn confirm_date(state: &mut State, return_to: Screen) -> Command<Msg> {
    let Some(date) = state.date_list.selected_item().map(|item| item.date) else {
        return Command::None;
    };
    info!("Browsing date set to {}", date);
    state.date = date;

    match return_to {
        Screen::SelectCity | Screen::SelectTheater => {
            state.screen = return_to;
            Command::None
        }
        _ => reissue_fetch(state),
    }
}

/// Repeat the fetch that produced the movie list, for the current date
pub fn reissue_fetch(state: &mut State) -> Command<Msg> {
    match state.fetch_kind() {
        FetchKind::CrossTheater => theaters::start_catalog_fetch(state),
        FetchKind::SingleTheater => {
            let ids = match (&state.city, &state.theater) {
                (Some(city), Some(theater)) => Some((city.id.clone(), theater.id.clone())),
                _ => None,
            };
            let Some((city_id, theater_id)) = ids else {
                return fail(
                    state,
                    "select a theater before trying another date",
                    Some(Screen::SelectTheater),
                    false,
                );
            };
            state.screen = Screen::LoadingSessions;
            fetch::fetch_sessions(&state.services, city_id, theater_id, state.date)
        }
    }
}

pub fn handle_next_day(state: &mut State) -> Command<Msg> {
    if !matches!(state.screen, Screen::Error { suggest_next_day: true, .. }) {
        return Command::None;
    }
    state.date = state.date.succ_opt().unwrap_or(state.date);
    info!("Trying next day {}", state.date);
    reissue_fetch(state)
}

pub fn handle_open_seat_map(state: &mut State) -> Command<Msg> {
    if !matches!(state.screen, Screen::ShowSessions { .. }) {
        return Command::None;
    }
    let Some(session) = state.session_list.selected_item().map(|item| item.session.clone()) else {
        return Command::None;
    };
    if !session.has_seat_selection {
        return fail(state, "this session does not support seat selection", None, false);
    }

    let session_id = session.id.clone();
    state.screen = Screen::LoadingSeatMap { session };
    fetch::fetch_session_details(&state.services, session_id)
}

pub fn handle_toggle_seat_numbers(state: &mut State) -> Command<Msg> {
    if matches!(state.screen, Screen::ShowSeatMap { .. }) {
        state.show_seat_numbers = !state.show_seat_numbers;
    }
    Command::None
}
