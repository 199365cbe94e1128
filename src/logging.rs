use anyhow::{anyhow, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_PATH: &str = "/tmp/chat-client.log";
pub const LOG_FILTER_ENV: &str = "CHAT_LOG";
pub const LOG_PATH_ENV: &str = "CHAT_LOG_PATH";

/// Installs the tracing subscriber when `CHAT_LOG` holds filter directives.
///
/// Output goes to a file whenever stderr is a terminal so it cannot tear the
/// TUI; otherwise it falls back to stderr. Returns whether logging is enabled.
pub fn init() -> Result<bool> {
    let Some(directives) = log_filter() else {
        return Ok(false);
    };
    let filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid {LOG_FILTER_ENV} directives '{directives}'"))?;

    let installed = match resolve_log_path() {
        Some(path) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(&path)?))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    installed.map_err(|error| anyhow!("failed to install log subscriber: {error}"))?;
    Ok(true)
}

fn log_filter() -> Option<String> {
    non_empty_env(LOG_FILTER_ENV)
}

fn resolve_log_path() -> Option<String> {
    non_empty_env(LOG_PATH_ENV).or_else(|| {
        if std::io::stderr().is_terminal() {
            Some(DEFAULT_LOG_PATH.to_string())
        } else {
            None
        }
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn open_log_file(path: &str) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{path}'"))
}
