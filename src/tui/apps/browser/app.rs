use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};
use ratatui::Frame;
use tokio_util::sync::CancellationToken;

use crate::api::{City, Theater};
use crate::catalog::CatalogService;
use crate::location::{LocationResolver, UserLocation};
use crate::tui::{App, Command, DispatchTarget, FilterList, FilterableList, Subscription};

use super::fetch;
use super::items::{CityItem, DateItem, MovieItem, SectionItem, SessionItem, TheaterItem, VisibilityItem};
use super::models::{CatalogSummary, FetchKind, Screen, SeatCountState};
use super::{update, view, Msg};

const SPINNER_INTERVAL: Duration = Duration::from_millis(100);

pub struct BrowserApp;

/// Everything the browser talks to outside its own state
#[derive(Clone)]
pub struct Services {
    pub catalog: CatalogService,
    pub location: Arc<LocationResolver>,
    /// Cancelled on quit; every background operation runs under a child token
    pub shutdown: CancellationToken,
    /// Parallel session lookups during cross-theater aggregation
    pub concurrency: usize,
}

pub struct BrowserParams {
    pub services: Services,
    /// Skip the city list and open this city directly
    pub initial_city: Option<String>,
    pub today: NaiveDate,
}

pub struct State {
    pub services: Services,
    pub screen: Screen,

    pub today: NaiveDate,
    /// Date being browsed
    pub date: NaiveDate,

    pub width: u16,
    pub height: u16,

    // Catalog data
    pub cities: Vec<City>,
    pub theaters: Vec<Theater>,
    pub city: Option<City>,
    pub theater: Option<Theater>,
    pub hidden_theaters: HashSet<String>,
    pub location: Option<UserLocation>,

    /// The movie list comes from the cross-theater aggregation
    pub cross_theater: bool,
    pub catalog_summary: CatalogSummary,
    pub selected_movie: Option<String>,

    pub show_seat_numbers: bool,
    pub spinner_frame: usize,
    pub seat_counts: HashMap<String, SeatCountState>,

    // Lists
    pub city_list: FilterList<CityItem>,
    pub theater_list: FilterList<TheaterItem>,
    pub visibility_list: FilterList<VisibilityItem>,
    pub movie_list: FilterList<MovieItem>,
    pub session_list: FilterList<SessionItem>,
    pub section_list: FilterList<SectionItem>,
    pub date_list: FilterList<DateItem>,
}

impl State {
    fn new(services: Services, today: NaiveDate) -> Self {
        Self {
            services,
            screen: Screen::LoadingCities,
            today,
            date: today,
            width: 0,
            height: 0,
            cities: Vec::new(),
            theaters: Vec::new(),
            city: None,
            theater: None,
            hidden_theaters: HashSet::new(),
            location: None,
            cross_theater: false,
            catalog_summary: CatalogSummary::default(),
            selected_movie: None,
            show_seat_numbers: true,
            spinner_frame: 0,
            seat_counts: HashMap::new(),
            city_list: FilterList::new("Select City"),
            theater_list: FilterList::new("Select Theater"),
            visibility_list: FilterList::new("Manage Theaters"),
            movie_list: FilterList::new("Select Movie"),
            session_list: FilterList::new("Sessions"),
            section_list: FilterList::new("Select Section"),
            date_list: FilterList::new("Select Date").without_filtering(),
        }
    }

    /// The list that receives typed characters and cursor keys on this screen
    pub fn active_list(&self) -> Option<&dyn FilterableList> {
        let list: &dyn FilterableList = match self.screen {
            Screen::SelectCity => &self.city_list,
            Screen::SelectTheater => &self.theater_list,
            Screen::ManageTheaters => &self.visibility_list,
            Screen::SelectMovie { .. } => &self.movie_list,
            Screen::ShowSessions { .. } => &self.session_list,
            Screen::SelectSection { .. } => &self.section_list,
            Screen::SelectDate { .. } => &self.date_list,
            _ => return None,
        };
        Some(list)
    }

    pub fn active_list_mut(&mut self) -> Option<&mut dyn FilterableList> {
        let list: &mut dyn FilterableList = match self.screen {
            Screen::SelectCity => &mut self.city_list,
            Screen::SelectTheater => &mut self.theater_list,
            Screen::ManageTheaters => &mut self.visibility_list,
            Screen::SelectMovie { .. } => &mut self.movie_list,
            Screen::ShowSessions { .. } => &mut self.session_list,
            Screen::SelectSection { .. } => &mut self.section_list,
            Screen::SelectDate { .. } => &mut self.date_list,
            _ => return None,
        };
        Some(list)
    }

    pub fn fetch_kind(&self) -> FetchKind {
        if self.cross_theater {
            FetchKind::CrossTheater
        } else {
            FetchKind::SingleTheater
        }
    }

    pub fn city_id(&self) -> String {
        self.city.as_ref().map(|city| city.id.clone()).unwrap_or_default()
    }

    /// `(lat, lng)` of the detected location
    pub fn origin(&self) -> Option<(f64, f64)> {
        self.location.as_ref().map(UserLocation::coordinates)
    }

    /// Theaters of the current city that are not hidden, in API order
    pub fn visible_theaters(&self) -> Vec<Theater> {
        self.theaters
            .iter()
            .filter(|theater| !self.hidden_theaters.contains(&theater.id))
            .cloned()
            .collect()
    }

    /// Session list of the selected movie
    pub fn sessions_screen(&self) -> Screen {
        Screen::ShowSessions {
            movie: self.selected_movie.clone().unwrap_or_default(),
        }
    }
}

impl App for BrowserApp {
    type State = State;
    type Msg = Msg;
    type InitParams = BrowserParams;

    fn init(params: BrowserParams) -> (State, Command<Msg>) {
        let state = State::new(params.services, params.today);

        let initial_city = params
            .initial_city
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if let Some(name) = initial_city {
            info!("Opening city '{}' from configuration", name);
            let command = fetch::fetch_city_by_name(&state.services, name);
            return (state, command);
        }

        let recent = match state.services.catalog.store().load_recent_cities() {
            Ok(recents) => recents
                .into_iter()
                .next()
                .filter(|recent| !recent.id.trim().is_empty() || !recent.name.trim().is_empty()),
            Err(e) => {
                warn!("Ignoring unreadable city history: {}", e);
                None
            }
        };

        let command = match recent {
            Some(recent) => {
                info!("Reopening recent city '{}'", recent.name);
                fetch::fetch_recent_city(&state.services, recent)
            }
            None => fetch::fetch_cities(&state.services),
        };
        (state, command)
    }

    fn update(state: &mut State, msg: Msg) -> Command<Msg> {
        update::update(state, msg)
    }

    fn view(state: &mut State, frame: &mut Frame) {
        view::render(state, frame);
    }

    fn subscriptions(state: &State) -> Vec<Subscription<Msg>> {
        let mut subs = vec![
            Subscription::ctrl_key(KeyCode::Char('c'), "quit", Msg::Quit),
            Subscription::keyboard(KeyCode::Esc, "back", Msg::Back),
        ];

        match &state.screen {
            Screen::SelectCity => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "select", Msg::Confirm));
                subs.push(Subscription::ctrl_key(KeyCode::Char('d'), "pick date", Msg::OpenDatePicker));
            }
            Screen::SelectTheater => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "select", Msg::Confirm));
                subs.push(Subscription::ctrl_key(KeyCode::Char('d'), "pick date", Msg::OpenDatePicker));
                subs.push(Subscription::ctrl_key(
                    KeyCode::Char('f'),
                    "movie across theaters",
                    Msg::BrowseAllTheaters,
                ));
                subs.push(Subscription::ctrl_key(KeyCode::Char('t'), "manage theaters", Msg::ManageTheaters));
                subs.push(Subscription::ctrl_key(KeyCode::Char('l'), "detect location", Msg::DetectLocation));
            }
            Screen::ManageTheaters => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "toggle visibility", Msg::Confirm));
                subs.push(Subscription::ctrl_key(KeyCode::Char('l'), "detect location", Msg::DetectLocation));
            }
            Screen::SelectMovie { .. } => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "select", Msg::Confirm));
                subs.push(Subscription::ctrl_key(KeyCode::Char('d'), "pick date", Msg::OpenDatePicker));
            }
            Screen::ShowSessions { .. } => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "open checkout", Msg::Confirm));
                subs.push(Subscription::keyboard(KeyCode::Tab, "seat map", Msg::OpenSeatMap));
                subs.push(Subscription::ctrl_key(KeyCode::Char('d'), "pick date", Msg::OpenDatePicker));
            }
            Screen::SelectSection { .. } => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "select section", Msg::Confirm));
            }
            Screen::SelectDate { .. } => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "select date", Msg::Confirm));
            }
            Screen::ShowSeatMap { .. } => {
                subs.push(Subscription::keyboard(KeyCode::Char('n'), "toggle numbers", Msg::ToggleSeatNumbers));
            }
            Screen::Error {
                suggest_next_day: true,
                ..
            } => {
                subs.push(Subscription::keyboard(KeyCode::Enter, "try next day", Msg::NextDay));
                subs.push(Subscription::ctrl_key(KeyCode::Char('d'), "pick date", Msg::OpenDatePicker));
            }
            _ => {}
        }

        // Typed characters reach the filter first, so `q` only quits where no list is focused
        subs.push(Subscription::keyboard(KeyCode::Char('q'), "quit", Msg::Quit));

        if state.screen.is_loading() {
            subs.push(Subscription::timer(SPINNER_INTERVAL, Msg::Tick));
        }
        subs
    }

    fn title() -> &'static str {
        "Ingresso TUI"
    }

    fn route_key(state: &State, key: KeyEvent) -> DispatchTarget<Msg> {
        let Some(list) = state.active_list() else {
            return DispatchTarget::PassThrough;
        };

        let plain = !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Char(c) if plain && list.filtering_enabled() => DispatchTarget::AppMsg(Msg::FilterInput(c.to_string())),
            KeyCode::Backspace | KeyCode::Delete if list.filtering_enabled() && list.is_filtered() => {
                DispatchTarget::AppMsg(Msg::FilterBackspace)
            }
            KeyCode::Up | KeyCode::Down | KeyCode::PageUp | KeyCode::PageDown | KeyCode::Home | KeyCode::End => {
                DispatchTarget::AppMsg(Msg::ListNavigate(key.code))
            }
            _ => DispatchTarget::PassThrough,
        }
    }

    fn on_resize(width: u16, height: u16) -> Option<Msg> {
        Some(Msg::Resized(width, height))
    }
}
