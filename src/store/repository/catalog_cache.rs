//! Repository for cached catalog snapshots

use crate::api::models::{City, SessionDay, Theater};
use crate::store::{CacheKind, Cached, Store, StoreResult};

fn cities_file() -> String {
    "cities.json".to_string()
}

fn theaters_file(city_id: &str) -> String {
    format!("theaters_{}.json", city_id)
}

fn sessions_file(city_id: &str, theater_id: &str, date: &str) -> String {
    format!("sessions_{}_{}_{}.json", city_id, theater_id, date)
}

pub fn load_cities(store: &Store) -> StoreResult<Cached<Vec<City>>> {
    store.load_envelope(CacheKind::Cities, &store.cache_path(&cities_file()))
}

pub fn save_cities(store: &Store, cities: &[City]) -> StoreResult<()> {
    store.save_envelope(&store.cache_path(&cities_file()), &cities, store.now())
}

pub fn load_theaters(store: &Store, city_id: &str) -> StoreResult<Cached<Vec<Theater>>> {
    store.load_envelope(CacheKind::Theaters, &store.cache_path(&theaters_file(city_id)))
}

pub fn save_theaters(store: &Store, city_id: &str, theaters: &[Theater]) -> StoreResult<()> {
    store.save_envelope(&store.cache_path(&theaters_file(city_id)), &theaters, store.now())
}

pub fn load_sessions(
    store: &Store,
    city_id: &str,
    theater_id: &str,
    date: &str,
) -> StoreResult<Cached<Vec<SessionDay>>> {
    let path = store.cache_path(&sessions_file(city_id, theater_id, date));
    store.load_envelope(CacheKind::Sessions, &path)
}

pub fn save_sessions(
    store: &Store,
    city_id: &str,
    theater_id: &str,
    date: &str,
    days: &[SessionDay],
) -> StoreResult<()> {
    let path = store.cache_path(&sessions_file(city_id, theater_id, date));
    store.save_envelope(&path, &days, store.now())
}
