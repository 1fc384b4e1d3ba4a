use crate::tui::{Command, DispatchTarget, Subscription};
use crossterm::event::KeyEvent;
use ratatui::Frame;

/// The main trait that all TUI apps must implement.
///
/// This follows the Elm architecture:
/// - State: the data that represents the app's current state
/// - Msg: events/actions that can happen
/// - update: handles messages and returns commands
/// - view: renders the current state
/// - subscriptions: declares what inputs the app wants to receive
pub trait App: Sized + Send + 'static {
    /// The app's state type
    type State: Send;

    /// The app's message type
    type Msg: Clone + Send + 'static;

    /// Parameters handed to `init`
    type InitParams: Send;

    /// Build the initial state and the command that starts it up
    fn init(params: Self::InitParams) -> (Self::State, Command<Self::Msg>);

    /// Update the state based on a message and return a command
    fn update(state: &mut Self::State, msg: Self::Msg) -> Command<Self::Msg>;

    /// Render the current state
    /// Note: Takes &mut so the view can record viewport sizes
    fn view(state: &mut Self::State, frame: &mut Frame);

    /// Declare what inputs this app wants to receive
    fn subscriptions(state: &Self::State) -> Vec<Subscription<Self::Msg>>;

    /// Return the app's title
    fn title() -> &'static str;

    /// Offer a key to the focused widget before global subscriptions see it
    fn route_key(_state: &Self::State, _key: KeyEvent) -> DispatchTarget<Self::Msg> {
        DispatchTarget::PassThrough
    }

    /// Message to send when the terminal is resized
    fn on_resize(_width: u16, _height: u16) -> Option<Self::Msg> {
        None
    }
}
