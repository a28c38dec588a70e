//! Consular registration - terminal wizard for citizen registration
//!
//! A Ratatui-based TUI that walks a citizen through the registration
//! steps, validating as they type and keeping a draft across restarts.

mod app;
mod config;
mod draft;
mod error;
mod flow;
mod schema;
mod session;
mod state;
mod submission;
mod ui;

use anyhow::{Context, Result};
use app::App;
use config::RegistrationConfig;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use draft::{DraftStore, FileStorage};
use flow::RegistrationFlow;
use ratatui::{backend::CrosstermBackend, Terminal};
use schema::SchemaRegistry;
use session::Identity;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use submission::OutboxSubmitter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RegistrationConfig::load().context("failed to read configuration")?;
    if !RegistrationConfig::is_present() {
        config.save().context("failed to write default configuration")?;
    }

    let data_dir = config.data_dir();
    init_logging(&data_dir)?;

    let identity = Identity::from_env(&config.identity)?;
    let store = open_draft_store(&config.drafts_dir(), identity.user_id());
    let registry =
        SchemaRegistry::consular_registration().context("invalid registration schema")?;
    let flow = match RegistrationFlow::start(
        identity,
        Arc::new(registry),
        store,
        config.flush_latency(),
    ) {
        Ok(flow) => flow,
        Err(err) if err.is_recoverable() => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err) => return Err(err.into()),
    };
    let submitter = OutboxSubmitter::new(config.outbox_dir());
    let mut app = App::new(flow, Box::new(submitter));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Persist outstanding edits whatever happened
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        tracing::error!(error = ?err, "Exiting on error");
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }

    Ok(())
}

/// File-backed draft store, or a memory-only one when the directory is unusable
fn open_draft_store(drafts_dir: &Path, user_id: &str) -> DraftStore {
    match fs::create_dir_all(drafts_dir) {
        Ok(()) => {
            let storage = FileStorage::new(drafts_dir);
            tracing::info!(drafts = %storage.dir().display(), "Using draft storage");
            DraftStore::new(Box::new(storage), user_id)
        }
        Err(e) => {
            tracing::warn!(
                drafts = %drafts_dir.display(),
                error = %e,
                "Draft directory unavailable, drafts will not survive a restart"
            );
            DraftStore::in_memory(user_id)
        }
    }
}

/// Log to a file in the data directory; the terminal belongs to the UI
fn init_logging(data_dir: &Path) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("consular-registration.log"))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "consular_registration=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key).await?;
            }
        }

        app.tick(Instant::now());

        if app.should_quit() {
            return Ok(());
        }
    }
}
