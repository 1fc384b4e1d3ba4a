use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tokio_util::sync::CancellationToken;

use crate::api::CatalogClient;
use crate::catalog::CatalogService;
use crate::config::AppConfig;
use crate::location::LocationResolver;
use crate::tui::apps::{BrowserApp, BrowserParams, Services};
use crate::tui::Runtime;

const FRAME: Duration = Duration::from_millis(16);

pub async fn tui_command(config: AppConfig) -> Result<()> {
    let client = CatalogClient::new(config.client_config()).context("Failed to build HTTP client")?;
    let store = config.store()?;
    info!(
        "Using cache dir {:?} and config dir {:?}",
        store.cache_dir(),
        store.config_dir()
    );

    let location = LocationResolver::with_defaults()
        .context("Failed to build location resolver")?
        .with_debug(config.location_debug);
    let shutdown = CancellationToken::new();
    let params = BrowserParams {
        services: Services {
            catalog: CatalogService::new(Arc::new(client), store),
            location: Arc::new(location),
            shutdown: shutdown.clone(),
            concurrency: config.aggregation_concurrency.max(1),
        },
        initial_city: config.initial_city.clone(),
        today: Local::now().date_naive(),
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runtime = Runtime::<BrowserApp>::new(params);
    let result = run_tui(&mut terminal, &mut runtime).await;
    shutdown.cancel();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui<B: Backend>(terminal: &mut Terminal<B>, runtime: &mut Runtime<BrowserApp>) -> Result<()> {
    let (width, height) = terminal::size()?;
    runtime.handle_resize(width, height);

    loop {
        let frame_start = Instant::now();

        // Process all pending events first for minimal input latency
        while event::poll(Duration::from_millis(0))? {
            let keep_running = match event::read()? {
                Event::Key(key) => runtime.handle_key(key),
                Event::Resize(width, height) => runtime.handle_resize(width, height),
                _ => true,
            };
            if !keep_running {
                info!("Leaving browser");
                return Ok(());
            }
        }

        if !runtime.poll_timers() || !runtime.drain_messages() {
            return Ok(());
        }

        terminal.draw(|frame| runtime.render(frame))?;

        if let Some(remaining) = FRAME.checked_sub(frame_start.elapsed()) {
            tokio::time::sleep(remaining).await;
        }
    }
}
