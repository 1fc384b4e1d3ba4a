//! List items shown by the browser and the builders that order them

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};

use crate::api::{City, Movie, Section, Session, SessionDay, Theater};
use crate::catalog::{theater_distance_km, MovieCatalog, SessionAtTheater};
use crate::store::{RecentCity, RecentTheater};
use crate::tui::ListItem;

use super::models::SeatCountState;

/// Days offered by the date picker, starting at the current date
pub const DATE_PICKER_DAYS: i64 = 5;

#[derive(Debug, Clone)]
pub struct CityItem {
    pub city: City,
    pub recent: bool,
}

impl ListItem for CityItem {
    fn title(&self) -> String {
        self.city.display_name()
    }

    fn description(&self) -> String {
        if self.recent {
            "Recent".to_string()
        } else {
            self.city.state.clone()
        }
    }

    fn filter_value(&self) -> String {
        [&self.city.name, &self.city.uf, &self.city.state, &self.city.url_key]
            .map(|s| s.as_str())
            .join(" ")
            .to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct TheaterItem {
    pub theater: Theater,
    pub recent: bool,
    pub distance_km: Option<f64>,
}

impl ListItem for TheaterItem {
    fn title(&self) -> String {
        self.theater.name.clone()
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();
        if self.recent {
            parts.push("Recent".to_string());
        }
        if !self.theater.neighborhood.is_empty() {
            parts.push(self.theater.neighborhood.clone());
        } else if !self.theater.address.is_empty() {
            parts.push(self.theater.address.clone());
        }
        if let Some(km) = self.distance_km {
            parts.push(format!("{:.1} km", km));
        }
        parts.join(" • ")
    }

    fn filter_value(&self) -> String {
        theater_filter_value(&self.theater)
    }
}

/// Row of the visibility manager
#[derive(Debug, Clone)]
pub struct VisibilityItem {
    pub theater: Theater,
    pub hidden: bool,
    pub distance_km: Option<f64>,
}

impl ListItem for VisibilityItem {
    fn title(&self) -> String {
        let mark = if self.hidden { " " } else { "x" };
        format!("[{}] {}", mark, self.theater.name)
    }

    fn description(&self) -> String {
        let mut parts = Vec::new();
        if !self.theater.neighborhood.is_empty() {
            parts.push(self.theater.neighborhood.clone());
        }
        if let Some(km) = self.distance_km {
            parts.push(format!("{:.1} km", km));
        }
        parts.push(if self.hidden { "hidden" } else { "visible" }.to_string());
        parts.join(" • ")
    }

    fn filter_value(&self) -> String {
        theater_filter_value(&self.theater)
    }
}

fn theater_filter_value(theater: &Theater) -> String {
    [&theater.name, &theater.neighborhood, &theater.address]
        .map(|s| s.as_str())
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone)]
pub struct MovieItem {
    pub movie: Movie,
    pub count: usize,
    /// Sessions across theaters; empty when browsing a single theater
    pub sessions: Vec<SessionAtTheater>,
}

impl ListItem for MovieItem {
    fn title(&self) -> String {
        self.movie.title.clone()
    }

    fn description(&self) -> String {
        if self.count > 0 {
            format!("{} sessions", self.count)
        } else {
            String::new()
        }
    }

    fn filter_value(&self) -> String {
        [&self.movie.title, &self.movie.original_title, &self.movie.content_rating]
            .map(|s| s.as_str())
            .join(" ")
            .to_lowercase()
    }
}

#[derive(Debug, Clone)]
pub struct SessionItem {
    pub session: Session,
    /// Set when browsing across theaters
    pub theater_name: Option<String>,
    pub distance_km: Option<f64>,
    pub count: SeatCountState,
}

impl ListItem for SessionItem {
    fn title(&self) -> String {
        let time = self
            .session
            .starts_at()
            .map(|at| at.format("%H:%M").to_string())
            .unwrap_or_else(|| "--:--".to_string());
        let room = match self.session.room.trim() {
            "" => "Sala",
            room => room,
        };
        match &self.theater_name {
            Some(theater) => format!("{} • {} • {}", time, theater, room),
            None => format!("{} • {}", time, room),
        }
    }

    fn description(&self) -> String {
        let prefix = self
            .distance_km
            .map(|km| format!("{:.1} km • ", km))
            .unwrap_or_default();
        format!(
            "{}{} • Full {} • Half {}{}",
            prefix,
            format_session_types(&self.session.types),
            format_price(self.session.price),
            format_price(half_price(self.session.price)),
            self.seat_hint()
        )
    }

    fn filter_value(&self) -> String {
        let mut parts = self.session.types.clone();
        parts.push(self.session.room.clone());
        parts.push(self.theater_name.clone().unwrap_or_default());
        parts.join(" ").to_lowercase()
    }
}

impl SessionItem {
    fn seat_hint(&self) -> String {
        if !self.session.has_seat_selection {
            return String::new();
        }
        match self.count {
            SeatCountState::Loaded(count) if count.non_ideal_available > 0 => format!(
                " • seats {} (ideal {} • front {} • pairs {})",
                count.available, count.ideal_available, count.non_ideal_available, count.pair_available
            ),
            SeatCountState::Loaded(count) => format!(
                " • seats {} (ideal {} • pairs {})",
                count.available, count.ideal_available, count.pair_available
            ),
            SeatCountState::Failed => " • seats n/a".to_string(),
            SeatCountState::NotRequested | SeatCountState::Pending => " • seats ...".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SectionItem {
    pub section: Section,
}

impl ListItem for SectionItem {
    fn title(&self) -> String {
        self.section.name.clone()
    }

    fn description(&self) -> String {
        if self.section.highest_price > 0.0 || self.section.lowest_price > 0.0 {
            format!(
                "R$ {:.2} - R$ {:.2}",
                self.section.lowest_price, self.section.highest_price
            )
        } else {
            String::new()
        }
    }
}

#[derive(Debug, Clone)]
pub struct DateItem {
    pub date: NaiveDate,
    pub today: NaiveDate,
}

impl ListItem for DateItem {
    fn title(&self) -> String {
        let label = format!("{} • {}", self.date.format("%a"), self.date.format("%d/%m"));
        if self.date == self.today {
            format!("{} (Today)", label)
        } else {
            label
        }
    }

    fn description(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

pub fn format_session_types(types: &[String]) -> String {
    let cleaned: Vec<&str> = types
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("Normal"))
        .collect();
    if cleaned.is_empty() {
        "Normal".to_string()
    } else {
        cleaned.join(", ")
    }
}

pub fn format_price(price: f64) -> String {
    if price <= 0.0 {
        "-".to_string()
    } else {
        format!("R$ {:.2}", price)
    }
}

pub fn half_price(price: f64) -> f64 {
    if price <= 0.0 { 0.0 } else { price / 2.0 }
}

/// Recent cities first (in recency order), then the rest alphabetically
pub fn build_city_items(cities: &[City], recents: &[RecentCity]) -> Vec<CityItem> {
    let mut used: HashSet<&str> = HashSet::new();
    let mut items = Vec::with_capacity(cities.len());

    for recent in recents {
        if let Some(city) = cities
            .iter()
            .find(|city| !used.contains(city.id.as_str()) && recent.matches(city))
        {
            used.insert(city.id.as_str());
            items.push(CityItem {
                city: city.clone(),
                recent: true,
            });
        }
    }

    let mut remaining: Vec<&City> = cities
        .iter()
        .filter(|city| !used.contains(city.id.as_str()))
        .collect();
    remaining.sort_by_key(|city| city.name.to_lowercase());
    items.extend(remaining.into_iter().map(|city| CityItem {
        city: city.clone(),
        recent: false,
    }));
    items
}

/// Visible theaters. With a known location they are ordered by distance;
/// otherwise recent theaters come first and the rest alphabetically.
pub fn build_theater_items(
    theaters: &[Theater],
    city_id: &str,
    hidden: &HashSet<String>,
    recents: &[RecentTheater],
    origin: Option<(f64, f64)>,
) -> Vec<TheaterItem> {
    let mut visible: Vec<&Theater> = theaters
        .iter()
        .filter(|theater| !hidden.contains(&theater.id))
        .collect();
    let is_recent = |theater: &Theater| recents.iter().any(|recent| recent.matches(city_id, theater));

    if origin.is_some() {
        sort_by_distance(&mut visible, origin);
        return visible
            .into_iter()
            .map(|theater| TheaterItem {
                theater: theater.clone(),
                recent: is_recent(theater),
                distance_km: theater_distance_km(theater, origin),
            })
            .collect();
    }

    let mut used: HashSet<&str> = HashSet::new();
    let mut items = Vec::with_capacity(visible.len());
    for recent in recents {
        if let Some(theater) = visible
            .iter()
            .find(|theater| !used.contains(theater.id.as_str()) && recent.matches(city_id, theater))
        {
            used.insert(theater.id.as_str());
            items.push(TheaterItem {
                theater: (*theater).clone(),
                recent: true,
                distance_km: None,
            });
        }
    }

    visible.retain(|theater| !used.contains(theater.id.as_str()));
    visible.sort_by_key(|theater| theater.name.to_lowercase());
    items.extend(visible.into_iter().map(|theater| TheaterItem {
        theater: theater.clone(),
        recent: false,
        distance_km: None,
    }));
    items
}

/// Every theater of the city, hidden ones included
pub fn build_visibility_items(
    theaters: &[Theater],
    hidden: &HashSet<String>,
    origin: Option<(f64, f64)>,
) -> Vec<VisibilityItem> {
    let mut sorted: Vec<&Theater> = theaters.iter().collect();
    if origin.is_some() {
        sort_by_distance(&mut sorted, origin);
    } else {
        sorted.sort_by_key(|theater| theater.name.to_lowercase());
    }

    sorted
        .into_iter()
        .map(|theater| VisibilityItem {
            theater: theater.clone(),
            hidden: hidden.contains(&theater.id),
            distance_km: theater_distance_km(theater, origin),
        })
        .collect()
}

/// Nearest first; theaters without coordinates last; ties by name
fn sort_by_distance(theaters: &mut [&Theater], origin: Option<(f64, f64)>) {
    theaters.sort_by(|a, b| {
        compare_distance(theater_distance_km(a, origin), theater_distance_km(b, origin))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
}

/// Known distances first, ascending. A total order, so it is safe for `sort_by`.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn build_movie_items(day: Option<&SessionDay>) -> Vec<MovieItem> {
    let mut items: Vec<MovieItem> = day
        .map(|day| day.movies.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|movie| MovieItem {
            movie: movie.clone(),
            count: movie.session_count(),
            sessions: Vec::new(),
        })
        .collect();
    items.sort_by_key(|item| item.movie.title.to_lowercase());
    items
}

pub fn build_catalog_items(catalog: &MovieCatalog) -> Vec<MovieItem> {
    let mut items: Vec<MovieItem> = catalog
        .movies
        .iter()
        .map(|aggregate| MovieItem {
            movie: aggregate.movie.clone(),
            count: aggregate.sessions.len(),
            sessions: aggregate.sessions.clone(),
        })
        .collect();
    items.sort_by_key(|item| item.movie.title.to_lowercase());
    items
}

/// Sessions of a movie at one theater, by start time
pub fn build_session_items(movie: &Movie, counts: &HashMap<String, SeatCountState>) -> Vec<SessionItem> {
    let mut sessions = movie.sessions();
    sessions.sort_by_key(|session| session.starts_at());

    sessions
        .into_iter()
        .map(|session| SessionItem {
            count: counts.get(&session.id).copied().unwrap_or_default(),
            session,
            theater_name: None,
            distance_km: None,
        })
        .collect()
}

/// Sessions of a movie across theaters: nearest first, then by start time,
/// then by theater name
pub fn build_global_session_items(
    sessions: &[SessionAtTheater],
    counts: &HashMap<String, SeatCountState>,
) -> Vec<SessionItem> {
    let mut sorted: Vec<&SessionAtTheater> = sessions.iter().collect();
    sorted.sort_by(|a, b| {
        compare_distance(a.distance_km, b.distance_km)
            .then_with(|| a.session.starts_at().cmp(&b.session.starts_at()))
            .then_with(|| a.theater.name.to_lowercase().cmp(&b.theater.name.to_lowercase()))
    });

    sorted
        .into_iter()
        .map(|entry| SessionItem {
            session: entry.session.clone(),
            theater_name: Some(entry.theater.name.clone()),
            distance_km: entry.distance_km,
            count: counts.get(&entry.session.id).copied().unwrap_or_default(),
        })
        .collect()
}

pub fn build_section_items(sections: Vec<Section>) -> Vec<SectionItem> {
    let mut items: Vec<SectionItem> = sections.into_iter().map(|section| SectionItem { section }).collect();
    items.sort_by_key(|item| item.section.name.to_lowercase());
    items
}

pub fn build_date_items(start: NaiveDate, today: NaiveDate) -> Vec<DateItem> {
    (0..DATE_PICKER_DAYS)
        .map(|offset| DateItem {
            date: start + Duration::days(offset),
            today,
        })
        .collect()
}
