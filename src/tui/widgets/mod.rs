pub mod list;

pub use list::{FilterList, FilterableList, ListItem, ListState};
