//! Data models for the Ingresso content and checkout APIs
//!
//! Every struct tolerates missing fields: the remote payloads are sparse and
//! a partially filled record is more useful than a decode failure.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A city as returned by `/states` and `/states/city/name/{name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct City {
    pub id: String,
    pub name: String,
    pub uf: String,
    pub state: String,
    pub url_key: String,
    pub time_zone: String,
}

impl City {
    /// Display title, e.g. "Sao Paulo (SP)"
    pub fn display_name(&self) -> String {
        if self.uf.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.uf)
        }
    }
}

/// A state grouping as returned by `/states`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub name: String,
    pub uf: String,
    pub cities: Vec<City>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Theater {
    pub id: String,
    pub name: String,
    pub address: String,
    pub neighborhood: String,
    pub city: String,
    pub uf: String,
    pub url_key: String,
    pub geolocation: GeoPoint,
}

impl Theater {
    /// Coordinates of the theater, `None` when the API reports `(0, 0)`
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        if self.geolocation.lat == 0.0 && self.geolocation.lng == 0.0 {
            None
        } else {
            Some((self.geolocation.lat, self.geolocation.lng))
        }
    }
}

/// One day of a theater's programme
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionDay {
    pub date: String,
    pub date_formatted: String,
    pub day_of_week: String,
    pub is_today: bool,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub original_title: String,
    pub content_rating: String,
    pub duration: String,
    pub rooms: Vec<Room>,
}

impl Movie {
    /// Key used to merge the same movie across theaters
    pub fn merge_key(&self) -> String {
        let id = self.id.trim();
        if !id.is_empty() {
            return format!("id:{}", id);
        }
        format!(
            "{}|{}",
            self.title.trim().to_lowercase(),
            self.original_title.trim().to_lowercase()
        )
    }

    /// All sessions across rooms, with blank session rooms filled from the room name
    pub fn sessions(&self) -> Vec<Session> {
        let mut sessions = Vec::new();
        for room in &self.rooms {
            for session in &room.sessions {
                let mut session = session.clone();
                if session.room.trim().is_empty() {
                    session.room = room.name.clone();
                }
                sessions.push(session);
            }
        }
        sessions
    }

    pub fn session_count(&self) -> usize {
        self.rooms.iter().map(|room| room.sessions.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Room {
    pub name: String,
    pub sessions: Vec<Session>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub price: f64,
    pub room: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub has_seat_selection: bool,
    pub date: SessionDate,
}

impl Session {
    pub fn starts_at(&self) -> Option<DateTime<FixedOffset>> {
        self.date.local_date
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionDate {
    pub local_date: Option<DateTime<FixedOffset>>,
}

/// Checkout view of a session: its sellable sections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionDetail {
    pub id: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub sections: Vec<Section>,
}

impl SessionDetail {
    /// Sections that sell individual seats
    pub fn seat_sections(&self) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|section| section.has_seat_selection && !section.id.is_empty())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub has_seat_selection: bool,
    pub layout: String,
    pub highest_price: f64,
    pub lowest_price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatMap {
    pub id: String,
    pub bounds: SeatBounds,
    pub lines: Vec<SeatLine>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatBounds {
    pub lines: i32,
    pub columns: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatLine {
    pub line: i32,
    pub seats: Vec<Seat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub label: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub row_index: i32,
    pub column_index: i32,
    pub line: i32,
    pub column: i32,
}

/// Seat status normalised from the free-form API string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Occupied,
    Blocked,
    Unknown,
}

impl Seat {
    pub fn status(&self) -> SeatStatus {
        match self.status.to_lowercase().as_str() {
            "available" => SeatStatus::Available,
            "occupied" => SeatStatus::Occupied,
            "blocked" | "unavailable" => SeatStatus::Blocked,
            _ => SeatStatus::Unknown,
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.kind.eq_ignore_ascii_case("Disability")
    }

    /// Row label printed in the seat map margin ("A", or the line number)
    pub fn row_label(&self) -> String {
        if let Some(first) = self.label.split_whitespace().next() {
            if first.len() == 1 && first.chars().all(|c| c.is_ascii_uppercase()) {
                return first.to_string();
            }
        }
        if self.line > 0 {
            self.line.to_string()
        } else {
            String::new()
        }
    }

    /// Seat number shown when labels are toggled on
    pub fn number_label(&self) -> String {
        self.label
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_decodes_type_and_local_date() {
        let json = r#"{
            "id": "s1",
            "price": 32.5,
            "room": "Sala 3",
            "type": ["3D", "Legendado"],
            "hasSeatSelection": true,
            "date": {"localDate": "2025-03-01T19:30:00-03:00"}
        }"#;

        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.types, vec!["3D", "Legendado"]);
        assert!(session.has_seat_selection);
        assert_eq!(
            session.starts_at().unwrap().format("%H:%M").to_string(),
            "19:30"
        );
    }

    #[test]
    fn test_movie_merge_key() {
        let with_id = Movie {
            id: " 42 ".into(),
            title: "Whatever".into(),
            ..Default::default()
        };
        assert_eq!(with_id.merge_key(), "id:42");

        let without_id = Movie {
            title: " Duna ".into(),
            original_title: "Dune".into(),
            ..Default::default()
        };
        assert_eq!(without_id.merge_key(), "duna|dune");
    }

    #[test]
    fn test_sessions_inherit_room_name() {
        let movie = Movie {
            rooms: vec![Room {
                name: "Sala 1".into(),
                sessions: vec![
                    Session { id: "a".into(), ..Default::default() },
                    Session { id: "b".into(), room: "VIP".into(), ..Default::default() },
                ],
            }],
            ..Default::default()
        };

        let sessions = movie.sessions();
        assert_eq!(sessions[0].room, "Sala 1");
        assert_eq!(sessions[1].room, "VIP");
    }

    #[test]
    fn test_seat_labels() {
        let seat = Seat {
            label: "F 12".into(),
            line: 6,
            ..Default::default()
        };
        assert_eq!(seat.row_label(), "F");
        assert_eq!(seat.number_label(), "12");

        let unlabeled = Seat { line: 3, ..Default::default() };
        assert_eq!(unlabeled.row_label(), "3");
        assert_eq!(unlabeled.number_label(), "");
    }

    #[test]
    fn test_theater_without_geolocation() {
        let theater: Theater = serde_json::from_str(r#"{"id":"1","name":"X"}"#).unwrap();
        assert_eq!(theater.coordinates(), None);
    }
}
