//! Terminal browser for the Ingresso cinema catalog

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod location;
pub mod store;
pub mod tui;
