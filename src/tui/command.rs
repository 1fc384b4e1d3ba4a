use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;

/// Target for a key event, decided by the app before global subscriptions run
///
/// - `AppMsg` goes straight to `update()`
/// - `PassThrough` falls through to the keyboard subscriptions
pub enum DispatchTarget<Msg> {
    AppMsg(Msg),
    PassThrough,
}

/// Commands represent side effects that apps want to perform.
/// They are returned from the update() function and executed by the runtime.
pub enum Command<Msg> {
    /// Do nothing
    None,

    /// Execute multiple commands in sequence
    Batch(Vec<Command<Msg>>),

    /// Perform an async operation and send the result as a message
    Perform(BoxFuture<'static, Msg>),

    /// Quit the application
    Quit,
}

impl<Msg> Command<Msg> {
    /// Helper to create a command that performs an async operation
    pub fn perform<F, T>(future: F, to_msg: impl FnOnce(T) -> Msg + Send + 'static) -> Self
    where
        F: Future<Output = T> + Send + 'static,
        Msg: Send + 'static,
    {
        Command::Perform(
            async move {
                let result = future.await;
                to_msg(result)
            }
            .boxed(),
        )
    }

    /// Helper to batch multiple commands, dropping the no-ops
    pub fn batch(commands: Vec<Command<Msg>>) -> Self {
        let mut commands: Vec<_> = commands
            .into_iter()
            .filter(|command| !command.is_none())
            .collect();
        match commands.len() {
            0 => Command::None,
            1 => commands.remove(0),
            _ => Command::Batch(commands),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Command::None)
    }

    /// Number of async operations this command will spawn
    pub fn perform_count(&self) -> usize {
        match self {
            Command::Perform(_) => 1,
            Command::Batch(commands) => commands.iter().map(Command::perform_count).sum(),
            Command::None | Command::Quit => 0,
        }
    }

    pub fn is_quit(&self) -> bool {
        match self {
            Command::Quit => true,
            Command::Batch(commands) => commands.iter().any(Command::is_quit),
            _ => false,
        }
    }
}

impl<Msg> Default for Command<Msg> {
    fn default() -> Self {
        Command::None
    }
}
