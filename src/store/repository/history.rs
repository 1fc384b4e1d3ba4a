//! Repository for the recently used cities and theaters

use log::warn;
use serde::{Deserialize, Serialize};

use crate::api::models::{City, Theater};
use crate::store::{read_bytes, write_json, Store, StoreError, StoreResult};

pub const MAX_RECENT_CITIES: usize = 8;
pub const MAX_RECENT_THEATERS: usize = 8;

const CITY_HISTORY_FILE: &str = "history.json";
const THEATER_HISTORY_FILE: &str = "theaters.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentCity {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub uf: String,
}

impl RecentCity {
    /// Same city by id, or by case-insensitive name within the same UF
    pub fn matches(&self, city: &City) -> bool {
        if !self.id.is_empty() && self.id == city.id {
            return true;
        }
        !self.name.is_empty()
            && self.name.to_lowercase() == city.name.to_lowercase()
            && self.uf.to_lowercase() == city.uf.to_lowercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentTheater {
    #[serde(default)]
    pub city_id: String,
    #[serde(default)]
    pub theater_id: String,
    #[serde(default)]
    pub name: String,
}

impl RecentTheater {
    /// Same theater by id, or by case-insensitive name within the same city
    pub fn matches(&self, city_id: &str, theater: &Theater) -> bool {
        if self.city_id != city_id {
            return false;
        }
        if !self.theater_id.is_empty() && self.theater_id == theater.id {
            return true;
        }
        !self.name.is_empty() && self.name.to_lowercase() == theater.name.to_lowercase()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CityHistory {
    #[serde(default)]
    cities: Vec<RecentCity>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TheaterHistory {
    #[serde(default)]
    theaters: Vec<RecentTheater>,
}

/// Recent cities, most recent first. Also accepts the legacy
/// `["Name", ...]` layout.
pub fn load_recent_cities(store: &Store) -> StoreResult<Vec<RecentCity>> {
    let Some(bytes) = read_bytes(&store.config_path(CITY_HISTORY_FILE))? else {
        return Ok(Vec::new());
    };

    if let Ok(history) = serde_json::from_slice::<CityHistory>(&bytes) {
        return Ok(history.cities);
    }

    if let Ok(legacy) = serde_json::from_slice::<Vec<String>>(&bytes) {
        return Ok(legacy
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| RecentCity {
                name,
                ..Default::default()
            })
            .collect());
    }

    Err(StoreError::InvalidFormat("invalid city history format".to_string()))
}

pub fn remember_city(store: &Store, city: &City) -> StoreResult<()> {
    let history = load_recent_cities(store).unwrap_or_else(|e| {
        warn!("Discarding unreadable city history: {}", e);
        Vec::new()
    });

    let entry = RecentCity {
        id: city.id.clone(),
        name: city.name.clone(),
        uf: city.uf.clone(),
    };
    let cities = push_front_capped(entry, history, MAX_RECENT_CITIES, |existing| existing.matches(city));

    write_json(&store.config_path(CITY_HISTORY_FILE), &CityHistory { cities })
}

pub fn load_recent_theaters(store: &Store) -> StoreResult<Vec<RecentTheater>> {
    let Some(bytes) = read_bytes(&store.config_path(THEATER_HISTORY_FILE))? else {
        return Ok(Vec::new());
    };

    serde_json::from_slice::<TheaterHistory>(&bytes)
        .map(|history| history.theaters)
        .map_err(|_| StoreError::InvalidFormat("invalid theater history format".to_string()))
}

pub fn remember_theater(store: &Store, city_id: &str, theater: &Theater) -> StoreResult<()> {
    let history = load_recent_theaters(store).unwrap_or_else(|e| {
        warn!("Discarding unreadable theater history: {}", e);
        Vec::new()
    });

    let entry = RecentTheater {
        city_id: city_id.to_string(),
        theater_id: theater.id.clone(),
        name: theater.name.clone(),
    };
    let theaters = push_front_capped(entry, history, MAX_RECENT_THEATERS, |existing| {
        existing.matches(city_id, theater)
    });

    write_json(&store.config_path(THEATER_HISTORY_FILE), &TheaterHistory { theaters })
}

/// Put `entry` first, drop older duplicates and anything beyond `cap`
fn push_front_capped<T>(entry: T, history: Vec<T>, cap: usize, is_same: impl Fn(&T) -> bool) -> Vec<T> {
    let mut next = Vec::with_capacity(cap);
    next.push(entry);
    next.extend(history.into_iter().filter(|existing| !is_same(existing)));
    next.truncate(cap);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("cache"), dir.path().join("config"));
        (dir, store)
    }

    fn city(id: &str, name: &str, uf: &str) -> City {
        City {
            id: id.into(),
            name: name.into(),
            uf: uf.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_recent_cities_are_capped_most_recent_first() {
        let (_dir, store) = temp_store();

        for i in 0..10 {
            store.remember_city(&city(&i.to_string(), &format!("City {i}"), "SP")).unwrap();
        }

        let recent = store.load_recent_cities().unwrap();
        assert_eq!(recent.len(), MAX_RECENT_CITIES);
        assert_eq!(recent[0].id, "9");
        assert_eq!(recent[7].id, "2");
    }

    #[test]
    fn test_remember_city_dedupes_by_id_and_name() {
        let (_dir, store) = temp_store();

        store.remember_city(&city("1", "Sao Paulo", "SP")).unwrap();
        store.remember_city(&city("2", "Campinas", "SP")).unwrap();
        store.remember_city(&city("1", "Sao Paulo", "SP")).unwrap();
        // same name and UF but no id match
        store.remember_city(&city("", "CAMPINAS", "sp")).unwrap();

        let recent = store.load_recent_cities().unwrap();
        let names: Vec<_> = recent.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["CAMPINAS", "Sao Paulo"]);
    }

    #[test]
    fn test_same_name_in_other_state_is_kept() {
        let (_dir, store) = temp_store();

        store.remember_city(&city("10", "Bom Jesus", "PI")).unwrap();
        store.remember_city(&city("11", "Bom Jesus", "RS")).unwrap();

        assert_eq!(store.load_recent_cities().unwrap().len(), 2);
    }

    #[test]
    fn test_legacy_city_history_is_accepted() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.config_dir()).unwrap();
        std::fs::write(store.config_dir().join("history.json"), r#"["Recife", "", "Natal"]"#).unwrap();

        let recent = store.load_recent_cities().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "Recife");
        assert!(recent[0].id.is_empty());
    }

    #[test]
    fn test_invalid_city_history_is_an_error() {
        let (_dir, store) = temp_store();
        std::fs::create_dir_all(store.config_dir()).unwrap();
        std::fs::write(store.config_dir().join("history.json"), "42").unwrap();

        let err = store.load_recent_cities().unwrap_err();
        assert_eq!(err.to_string(), "invalid city history format");

        // remembering over a corrupt file starts a fresh history
        store.remember_city(&city("1", "Recife", "PE")).unwrap();
        assert_eq!(store.load_recent_cities().unwrap().len(), 1);
    }

    #[test]
    fn test_recent_theaters_are_scoped_by_city() {
        let (_dir, store) = temp_store();
        let theater = Theater {
            id: "99".into(),
            name: "Cine Center".into(),
            ..Default::default()
        };

        store.remember_theater("1", &theater).unwrap();
        store.remember_theater("2", &theater).unwrap();
        store.remember_theater("1", &theater).unwrap();

        let recent = store.load_recent_theaters().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].city_id, "1");
        assert_eq!(recent[1].city_id, "2");
    }
}
