use crossterm::event::{KeyEvent, KeyEventKind};
use ratatui::Frame;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::tui::{App, Command, DispatchTarget, KeyBinding, Subscription};

/// The runtime manages the app's state, event routing, and command execution
///
/// Async work is spawned on tokio; every finished operation sends exactly one
/// message back over an unbounded channel, and messages are applied on the
/// caller's loop through `drain_messages`. `update` therefore only ever runs
/// on one task.
pub struct Runtime<A: App> {
    /// Current app state
    state: A::State,

    /// Keyboard subscriptions
    key_subscriptions: HashMap<KeyBinding, A::Msg>,

    /// Timer subscriptions: (interval, last_tick, msg)
    timers: Vec<(Duration, Instant, A::Msg)>,

    /// Results of spawned async commands
    sender: mpsc::UnboundedSender<A::Msg>,
    receiver: mpsc::UnboundedReceiver<A::Msg>,

    /// Spawned operations whose message has not been applied yet
    pending: usize,

    quit_requested: bool,
}

impl<A: App> Runtime<A> {
    /// Must be called from within a tokio runtime; the init command may spawn work
    pub fn new(params: A::InitParams) -> Self {
        let (state, init_command) = A::init(params);
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut runtime = Self {
            state,
            key_subscriptions: HashMap::new(),
            timers: Vec::new(),
            sender,
            receiver,
            pending: 0,
            quit_requested: false,
        };

        runtime.update_subscriptions();
        runtime.execute_command(init_command);
        runtime
    }

    /// Get a reference to the app's state
    pub fn state(&self) -> &A::State {
        &self.state
    }

    pub fn title(&self) -> &'static str {
        A::title()
    }

    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Async operations still running
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Get keyboard bindings for the help line
    pub fn key_bindings(&self) -> Vec<(KeyBinding, String)> {
        A::subscriptions(&self.state)
            .into_iter()
            .filter_map(|sub| match sub {
                Subscription::Keyboard { key, description, .. } => Some((key, description)),
                _ => None,
            })
            .collect()
    }

    /// Apply a message directly. Returns false once the app asked to quit.
    pub fn dispatch(&mut self, msg: A::Msg) -> bool {
        let command = A::update(&mut self.state, msg);
        let keep_running = self.execute_command(command);
        // Subscriptions may depend on state
        self.update_subscriptions();
        keep_running
    }

    /// Handle a keyboard event. Returns false once the app asked to quit.
    pub fn handle_key(&mut self, key_event: KeyEvent) -> bool {
        if key_event.kind != KeyEventKind::Press {
            return true;
        }

        // The focused widget gets the first look at the key
        if let DispatchTarget::AppMsg(msg) = A::route_key(&self.state, key_event) {
            return self.dispatch(msg);
        }

        let binding = KeyBinding::from_event(&key_event);
        if let Some(msg) = self.key_subscriptions.get(&binding).cloned() {
            log::debug!("Runtime - subscription matched key {:?}", binding);
            return self.dispatch(msg);
        }

        log::trace!("Runtime - no subscription for key {:?}", binding);
        true
    }

    pub fn handle_resize(&mut self, width: u16, height: u16) -> bool {
        match A::on_resize(width, height) {
            Some(msg) => self.dispatch(msg),
            None => true,
        }
    }

    /// Fire timers whose interval elapsed
    pub fn poll_timers(&mut self) -> bool {
        let now = Instant::now();
        let mut due = Vec::new();
        for (interval, last_tick, msg) in self.timers.iter_mut() {
            if now.duration_since(*last_tick) >= *interval {
                *last_tick = now;
                due.push(msg.clone());
            }
        }

        for msg in due {
            if !self.dispatch(msg) {
                return false;
            }
        }
        true
    }

    /// Apply every async result that has arrived, without waiting
    pub fn drain_messages(&mut self) -> bool {
        while let Ok(msg) = self.receiver.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            if !self.dispatch(msg) {
                return false;
            }
        }
        true
    }

    /// Wait for every outstanding operation, including those spawned while
    /// applying results
    pub async fn run_until_idle(&mut self) -> bool {
        while self.pending > 0 {
            let Some(msg) = self.receiver.recv().await else {
                break;
            };
            self.pending -= 1;
            if !self.dispatch(msg) {
                return false;
            }
        }
        true
    }

    pub fn render(&mut self, frame: &mut Frame) {
        A::view(&mut self.state, frame);
    }

    /// Execute a command. Returns false for `Command::Quit`.
    fn execute_command(&mut self, command: Command<A::Msg>) -> bool {
        match command {
            Command::None => true,
            Command::Batch(commands) => {
                let mut keep_running = true;
                for command in commands {
                    keep_running &= self.execute_command(command);
                }
                keep_running
            }
            Command::Perform(future) => {
                let sender = self.sender.clone();
                self.pending += 1;
                tokio::spawn(async move {
                    let msg = future.await;
                    if sender.send(msg).is_err() {
                        log::debug!("Runtime dropped before async result arrived");
                    }
                });
                true
            }
            Command::Quit => {
                self.quit_requested = true;
                false
            }
        }
    }

    /// Update subscriptions based on current state
    fn update_subscriptions(&mut self) {
        self.key_subscriptions.clear();

        let mut timers = Vec::new();
        for sub in A::subscriptions(&self.state) {
            match sub {
                Subscription::Keyboard { key, msg, .. } => {
                    // description is used for help lines, not for runtime lookup
                    self.key_subscriptions.insert(key, msg);
                }
                Subscription::Timer { interval, msg } => {
                    // Keep the phase of timers that survive the refresh
                    let last_tick = self
                        .timers
                        .iter()
                        .find(|(existing, _, _)| *existing == interval)
                        .map(|(_, last_tick, _)| *last_tick)
                        .unwrap_or_else(Instant::now);
                    timers.push((interval, last_tick, msg));
                }
            }
        }
        self.timers = timers;
    }
}
