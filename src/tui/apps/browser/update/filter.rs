use crossterm::event::KeyCode;

use crate::tui::Command;

use super::super::app::State;
use super::super::Msg;
use super::seat_counts;

pub fn handle_filter_input(state: &mut State, text: &str) -> Command<Msg> {
    let Some(list) = state.active_list_mut() else {
        return Command::None;
    };
    list.push_filter(text);
    seat_counts::request_visible(state)
}

pub fn handle_filter_backspace(state: &mut State) -> Command<Msg> {
    let Some(list) = state.active_list_mut() else {
        return Command::None;
    };
    if !list.pop_filter() {
        return Command::None;
    }
    seat_counts::request_visible(state)
}

pub fn handle_navigate(state: &mut State, key: KeyCode) -> Command<Msg> {
    let Some(list) = state.active_list_mut() else {
        return Command::None;
    };
    if !list.handle_key(key) {
        return Command::None;
    }
    seat_counts::request_visible(state)
}
