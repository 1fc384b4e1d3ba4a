pub mod tui;

pub use tui::tui_command;
