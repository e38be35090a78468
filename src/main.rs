//! checkin - Class Check-In
//!
//! A terminal application for running a class sign-in desk: set up the
//! current class, check attendees in, export the attendee list to CSV and
//! archive finished classes.

use anyhow::{Context, Result};
use checkin::application::{App, AppMode, CheckInService};
use checkin::infrastructure::{Config, FileStore, StateStore};
use checkin::presentation::{InputHandler, render_ui};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Check attendees into a class from the terminal
#[derive(Parser)]
#[command(name = "checkin")]
#[command(about = "Class check-in desk with attendee export", long_about = None)]
struct Cli {
    /// Directory holding the stored classes and settings
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file (default: the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory CSV exports are written to
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Entry point for the check-in application.
///
/// Resolves configuration, starts file logging, opens the store and runs
/// the terminal event loop until the user quits.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)?.merge(Config {
        data_dir: cli.data_dir.clone(),
        export_dir: cli.export_dir.clone(),
        log_file: None,
    });

    init_logging(&config.resolved_log_file()?, cli.verbose)?;
    debug!(config = %config_path.display(), "loaded configuration");

    let data_dir = config.resolved_data_dir()?;
    let store = StateStore::open(FileStore::new(&data_dir))
        .with_context(|| format!("failed to open store in {}", data_dir.display()))?;
    info!(data_dir = %data_dir.display(), "store opened");

    let mut app = App::new(
        CheckInService::with_system_defaults(store),
        config.resolved_export_dir(),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("terminal error")?;
    info!("exiting");
    Ok(())
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging(path: &Path, verbose: u8) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(verbose >= 2)
        .init();
    Ok(())
}

/// Main application event loop.
///
/// Continues running until the user presses 'q' on the home screen.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if app.mode == AppMode::Normal => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
