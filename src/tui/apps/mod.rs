pub mod browser;

pub use browser::{BrowserApp, BrowserParams, Services};
