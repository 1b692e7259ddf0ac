//! Settings: parse/write `userdir.conf` and merge command-line overrides.
//!
//! The file uses the same `key = value` format as the theme and keybinding
//! files. Command-line flags (and their environment variables) win over the
//! file, which wins over the built-in defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::directory::DEFAULT_LOAD_MORE_DELAY;
use crate::search::Pagination;
use crate::source::DEFAULT_BASE_URL;

pub const APP_DIR: &str = "user-directory";
pub const SETTINGS_FILE: &str = "userdir.conf";

/// Command-line interface of the `user-directory` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "user-directory", version, about = "Browse a directory of users in the terminal")]
pub struct Cli {
    /// Settings file to read (defaults to ./userdir.conf, then the config dir)
    #[arg(long, env = "USERDIR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the users API
    #[arg(long = "api-url", env = "USERDIR_API_URL")]
    pub api_url: Option<String>,

    /// Entries revealed per page increment
    #[arg(long, env = "USERDIR_PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Where the session token and profile are kept
    #[arg(long, env = "USERDIR_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Log file; the terminal itself is taken by the UI
    #[arg(long, env = "USERDIR_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: usize,
    pub load_more_delay: Duration,
    pub request_timeout: Duration,
    pub session_file: PathBuf,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            page_size: Pagination::DEFAULT_PAGE_SIZE,
            load_more_delay: DEFAULT_LOAD_MORE_DELAY,
            request_timeout: Duration::from_secs(30),
            session_file: config_file_write_path("session.conf"),
            log_file: config_file_write_path("user-directory.log"),
        }
    }
}

impl Settings {
    /// Load the settings file (if any) and apply the command-line overrides.
    pub fn resolve(cli: &Cli) -> Self {
        let file = match &cli.config {
            Some(path) => Some(path.clone()),
            None => config_file_read_path(SETTINGS_FILE),
        };
        let mut settings = file
            .as_deref()
            .and_then(Self::from_file)
            .unwrap_or_default();

        if let Some(url) = &cli.api_url {
            settings.api_base_url = url.clone();
        }
        if let Some(size) = cli.page_size {
            settings.page_size = size.max(1);
        }
        if let Some(path) = &cli.session_file {
            settings.session_file = path.clone();
        }
        if let Some(path) = &cli.log_file {
            settings.log_file = path.clone();
        }
        settings
    }

    /// Parse a settings file. Unknown keys and malformed values are skipped
    /// and keep their defaults. Returns `None` if the file cannot be read.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        let mut settings = Self::default();
        for raw in contents.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut parts = line.splitn(2, '=');
            let key = parts.next().map(|s| s.trim()).unwrap_or("");
            let val = parts.next().map(|s| s.trim()).unwrap_or("");
            if key.is_empty() || val.is_empty() {
                continue;
            }
            match key {
                "api_base_url" => settings.api_base_url = val.to_string(),
                "page_size" => {
                    if let Ok(n) = val.parse::<usize>() {
                        settings.page_size = n.max(1);
                    }
                }
                "load_more_delay_ms" => {
                    if let Ok(ms) = val.parse::<u64>() {
                        settings.load_more_delay = Duration::from_millis(ms);
                    }
                }
                "request_timeout_secs" => {
                    if let Ok(secs) = val.parse::<u64>() {
                        settings.request_timeout = Duration::from_secs(secs);
                    }
                }
                "session_file" => settings.session_file = PathBuf::from(val),
                "log_file" => settings.log_file = PathBuf::from(val),
                _ => {}
            }
        }
        Some(settings)
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# user-directory settings\n");
        buf.push_str("# Command-line flags and USERDIR_* variables override these.\n\n");
        let _ = writeln!(&mut buf, "api_base_url = {}", self.api_base_url);
        let _ = writeln!(&mut buf, "page_size = {}", self.page_size);
        let _ = writeln!(&mut buf, "load_more_delay_ms = {}", self.load_more_delay.as_millis());
        let _ = writeln!(&mut buf, "request_timeout_secs = {}", self.request_timeout.as_secs());
        let _ = writeln!(&mut buf, "session_file = {}", self.session_file.display());
        let _ = writeln!(&mut buf, "log_file = {}", self.log_file.display());
        std::fs::write(path, buf)
    }
}

/// First existing location of `name`: the working directory, then the
/// per-user config directory.
pub fn config_file_read_path(name: &str) -> Option<PathBuf> {
    let local = PathBuf::from(name);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR).join(name))
        .filter(|p| p.exists())
}

/// Where a new `name` file should be created: the per-user config directory
/// when there is one, the working directory otherwise.
pub fn config_file_write_path(name: &str) -> PathBuf {
    match dirs::config_dir() {
        Some(d) => d.join(APP_DIR).join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            "# comment\napi_base_url = http://localhost:9000\npage_size = 12\nload_more_delay_ms = 0\nbogus = 1\npage_size_typo\n",
        )
        .unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.api_base_url, "http://localhost:9000");
        assert_eq!(settings.page_size, 12);
        assert_eq!(settings.load_more_delay, Duration::ZERO);
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn cli_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        Settings { page_size: 9, ..Settings::default() }.write_file(&path).unwrap();

        let cli = Cli::parse_from([
            "user-directory",
            "--config",
            path.to_str().unwrap(),
            "--api-url",
            "http://example.test",
        ]);
        let settings = Settings::resolve(&cli);
        assert_eq!(settings.page_size, 9);
        assert_eq!(settings.api_base_url, "http://example.test");
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let cli = Cli::parse_from(["user-directory", "--page-size", "0", "--config", "/nonexistent/userdir.conf"]);
        assert_eq!(Settings::resolve(&cli).page_size, 1);
    }
}
