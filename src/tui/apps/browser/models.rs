use crate::api::{SeatMap, Section, Session};
use crate::catalog::SeatCount;

/// The screen currently shown. Exactly one is active at a time and each
/// variant carries only the data it needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    LoadingCities,
    SelectCity,
    LoadingTheaters,
    SelectTheater,
    ManageTheaters,
    LoadingSessions,
    SelectMovie {
        cross_theater: bool,
    },
    ShowSessions {
        movie: String,
    },
    SelectDate {
        return_to: Box<Screen>,
    },
    LoadingSeatMap {
        session: Session,
    },
    SelectSection {
        session: Session,
    },
    ShowSeatMap {
        session: Session,
        section: Section,
        seat_map: SeatMap,
    },
    Error {
        message: String,
        recover_to: Box<Screen>,
        suggest_next_day: bool,
    },
}

impl Screen {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Screen::LoadingCities | Screen::LoadingTheaters | Screen::LoadingSessions | Screen::LoadingSeatMap { .. }
        )
    }

    pub fn loading_title(&self) -> &'static str {
        match self {
            Screen::LoadingCities => "Loading cities",
            Screen::LoadingTheaters => "Loading theaters",
            Screen::LoadingSessions => "Loading sessions",
            Screen::LoadingSeatMap { .. } => "Loading seat map",
            _ => "Loading",
        }
    }

    /// Whether the header shows the browsing date on this screen
    pub fn shows_date(&self) -> bool {
        matches!(
            self,
            Screen::SelectCity
                | Screen::SelectTheater
                | Screen::ManageTheaters
                | Screen::SelectMovie { .. }
                | Screen::ShowSessions { .. }
                | Screen::SelectDate { .. }
                | Screen::ShowSeatMap { .. }
        )
    }
}

/// Which fetch produces the movie list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Sessions of the selected theater
    SingleTheater,
    /// Sessions aggregated across every visible theater
    CrossTheater,
}

/// Lazily fetched seat statistics of one session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum SeatCountState {
    #[default]
    NotRequested,
    Pending,
    Loaded(SeatCount),
    Failed,
}

/// Failure of the cross-theater catalog fetch
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFailure {
    pub message: String,
    /// Zero sessions on the day, so trying the next day makes sense
    pub suggest_next_day: bool,
}

/// Partial failures of the last cross-theater fetch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CatalogSummary {
    pub failed: usize,
    pub ignored: usize,
}
