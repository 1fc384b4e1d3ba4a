//! Lazy seat statistics for the sessions on screen
//!
//! Only the page currently visible is requested. An entry is marked pending
//! before its request is spawned, so each session is fetched at most once.

use log::debug;

use crate::catalog::SeatCount;
use crate::tui::Command;

use super::super::app::State;
use super::super::fetch;
use super::super::models::{Screen, SeatCountState};
use super::super::Msg;

/// Sessions on the visible page that support seat selection and were never requested
pub fn pending_on_visible_page(state: &State) -> Vec<String> {
    if !matches!(state.screen, Screen::ShowSessions { .. }) {
        return Vec::new();
    }

    let mut ids: Vec<String> = Vec::new();
    for item in state.session_list.page_items() {
        let id = &item.session.id;
        if !item.session.has_seat_selection || id.is_empty() {
            continue;
        }
        if state.seat_counts.contains_key(id) || ids.contains(id) {
            continue;
        }
        ids.push(id.clone());
    }
    ids
}

pub fn request_visible(state: &mut State) -> Command<Msg> {
    let ids = pending_on_visible_page(state);
    if ids.is_empty() {
        return Command::None;
    }
    debug!("Requesting seat counts for {} sessions", ids.len());

    let mut commands = Vec::with_capacity(ids.len());
    for id in ids {
        state.seat_counts.insert(id.clone(), SeatCountState::Pending);
        set_item_count(state, &id, SeatCountState::Pending);
        commands.push(fetch::fetch_seat_count(&state.services, id));
    }
    Command::batch(commands)
}

pub fn handle_seat_count_loaded(
    state: &mut State,
    session_id: String,
    result: Result<SeatCount, String>,
) -> Command<Msg> {
    let count = match result {
        Ok(count) => SeatCountState::Loaded(count),
        Err(_) => SeatCountState::Failed,
    };
    set_item_count(state, &session_id, count);
    state.seat_counts.insert(session_id, count);
    Command::None
}

fn set_item_count(state: &mut State, session_id: &str, count: SeatCountState) {
    state
        .session_list
        .update_item(|item| item.session.id == session_id, |item| item.count = count);
}
