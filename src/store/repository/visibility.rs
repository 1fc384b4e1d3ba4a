//! Repository for per-city hidden theaters

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::store::{read_json, write_json, Store, StoreError, StoreResult};

const VISIBILITY_FILE: &str = "theater_visibility.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct TheaterVisibility {
    #[serde(default)]
    hidden_by_city: BTreeMap<String, Vec<String>>,
}

fn load(store: &Store) -> StoreResult<TheaterVisibility> {
    Ok(read_json(&store.config_path(VISIBILITY_FILE))?.unwrap_or_default())
}

pub fn load_hidden_theaters(store: &Store, city_id: &str) -> StoreResult<HashSet<String>> {
    let city_id = city_id.trim();
    if city_id.is_empty() {
        return Ok(HashSet::new());
    }

    let visibility = load(store)?;
    Ok(visibility
        .hidden_by_city
        .get(city_id)
        .into_iter()
        .flatten()
        .filter(|id| !id.is_empty())
        .cloned()
        .collect())
}

/// Mark a theater hidden or visible. Idempotent; a city whose hidden set
/// becomes empty is removed from the file.
pub fn set_theater_hidden(store: &Store, city_id: &str, theater_id: &str, hidden: bool) -> StoreResult<()> {
    let city_id = city_id.trim();
    let theater_id = theater_id.trim();
    if city_id.is_empty() || theater_id.is_empty() {
        return Err(StoreError::InvalidInput(
            "city id and theater id are required".to_string(),
        ));
    }

    let mut visibility = load(store)?;
    let mut current = visibility.hidden_by_city.remove(city_id).unwrap_or_default();

    let present = current.iter().any(|id| id == theater_id);
    if hidden && !present {
        current.push(theater_id.to_string());
    } else if !hidden {
        current.retain(|id| id != theater_id);
    }

    if !current.is_empty() {
        current.sort();
        visibility.hidden_by_city.insert(city_id.to_string(), current);
    }

    write_json(&store.config_path(VISIBILITY_FILE), &visibility)
}
