//! Repository layer for the file store

pub mod catalog_cache;
pub mod history;
pub mod visibility;
