//! user-directory binary entry point.
//!
//! Resolves settings, sends logs to a file, initializes the terminal in raw
//! mode, runs the TUI event loop and restores the terminal state on exit.
//!
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use user_directory::Result;
use user_directory::app::{self, AppState, Keymap, SessionStore, Theme};
use user_directory::config::{Cli, Settings, config_file_read_path, config_file_write_path};
use user_directory::source::HttpUserSource;
use user_directory::store::{FileStore, MemoryStore};

/// Route `tracing` output to `path`; stdout belongs to the UI.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "user_directory=info".into()))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Existing `name` in the working or config directory, else the config
/// directory location where a default will be written.
fn ui_config_path(name: &str) -> String {
    let path = config_file_read_path(name).unwrap_or_else(|| {
        let path = config_file_write_path(name);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        path
    });
    path.to_string_lossy().into_owned()
}

fn open_session_store(settings: &Settings) -> SessionStore {
    match FileStore::open(&settings.session_file) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!(error = %e, "session file unavailable, keeping the session in memory");
            Box::new(MemoryStore::new())
        }
    }
}

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::resolve(&cli);
    init_logging(&settings.log_file)?;
    info!(api = %settings.api_base_url, page_size = settings.page_size, "starting");

    let rt = tokio::runtime::Runtime::new().context("start async runtime")?;
    let source = HttpUserSource::new(settings.api_base_url.clone(), settings.request_timeout)
        .context("build HTTP client")?;
    let store = open_session_store(&settings);
    let theme = Theme::load_or_init(&ui_config_path("theme.conf"));
    let keymap = Keymap::load_or_init(&ui_config_path("keybinds.conf"));
    let mut state = AppState::new(settings, store, theme, keymap);

    let mut terminal = init_terminal().map_err(|e| anyhow::anyhow!("init terminal: {e}"))?;

    let res = app::run(&mut terminal, &mut state, &rt, &source);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).ok();
    terminal.show_cursor().ok();

    if let Err(err) = res {
        warn!(error = %err, "application error");
        eprintln!("application error: {err}");
    }
    Ok(())
}
