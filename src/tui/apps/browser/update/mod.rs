pub mod data_loading;
pub mod filter;
pub mod navigation;
pub mod seat_counts;
pub mod theaters;

use crate::tui::Command;

use super::app::State;
use super::Msg;

pub fn update(state: &mut State, msg: Msg) -> Command<Msg> {
    match msg {
        // Focused list
        Msg::FilterInput(text) => filter::handle_filter_input(state, &text),
        Msg::FilterBackspace => filter::handle_filter_backspace(state),
        Msg::ListNavigate(key) => filter::handle_navigate(state, key),

        // Terminal
        Msg::Resized(width, height) => navigation::handle_resize(state, width, height),
        Msg::Tick => navigation::handle_tick(state),

        // Navigation
        Msg::Confirm => navigation::handle_confirm(state),
        Msg::Back => navigation::handle_back(state),
        Msg::Quit => navigation::handle_quit(state),
        Msg::OpenDatePicker => navigation::handle_open_date_picker(state),
        Msg::NextDay => navigation::handle_next_day(state),
        Msg::OpenSeatMap => navigation::handle_open_seat_map(state),
        Msg::ToggleSeatNumbers => navigation::handle_toggle_seat_numbers(state),

        // Theaters
        Msg::BrowseAllTheaters => theaters::handle_browse_all(state),
        Msg::ManageTheaters => theaters::handle_manage(state),
        Msg::DetectLocation => theaters::handle_detect_location(state),

        // Async results
        Msg::CitiesLoaded(result) => data_loading::handle_cities_loaded(state, result),
        Msg::CityResolved(result) => data_loading::handle_city_resolved(state, result),
        Msg::TheatersLoaded(result) => data_loading::handle_theaters_loaded(state, result),
        Msg::SessionsLoaded(result) => data_loading::handle_sessions_loaded(state, result),
        Msg::CatalogLoaded(result) => data_loading::handle_catalog_loaded(state, result),
        Msg::LocationDetected(result) => theaters::handle_location_detected(state, result),
        Msg::SessionDetailsLoaded(result) => data_loading::handle_session_details_loaded(state, result),
        Msg::SeatMapLoaded(section, result) => data_loading::handle_seat_map_loaded(state, section, result),
        Msg::SeatCountLoaded(session_id, result) => seat_counts::handle_seat_count_loaded(state, session_id, result),
        Msg::BrowserOpened(result) => data_loading::handle_browser_opened(state, result),
    }
}
