//! Logging for stewardctl
//!
//! Everything goes to a log file when one can be opened. Stderr only shows
//! warnings and errors unless `--verbose` is given, so the dashboard stays
//! readable.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STEWARD_LOG_FILE";
const LOG_SUBPATH: &str = "node-steward/stewardctl.log";

/// Discover log file path with fallback chain
///
/// Priority:
/// 1. $STEWARD_LOG_FILE (explicit override)
/// 2. $XDG_STATE_HOME/node-steward/stewardctl.log
/// 3. ~/.local/state/node-steward/stewardctl.log
pub fn discover_log_path() -> Option<PathBuf> {
    log_path_from(
        std::env::var_os(LOG_ENV).map(PathBuf::from),
        std::env::var_os("XDG_STATE_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

/// The discovery chain over explicit inputs
pub fn log_path_from(
    explicit: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    if let Some(state) = xdg_state_home.filter(|p| p.is_absolute()) {
        return Some(state.join(LOG_SUBPATH));
    }
    home.map(|home| home.join(".local/state").join(LOG_SUBPATH))
}

fn open_log(path: &Path) -> std::io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber; returns the log file in use, if any
///
/// `RUST_LOG` wins over `level`, `--verbose` forces debug.
pub fn init(level: &str, verbose: bool) -> Option<PathBuf> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    let stderr_level = if verbose { Level::TRACE } else { Level::WARN };
    let stderr = std::io::stderr.with_max_level(stderr_level);

    let log_file = discover_log_path().and_then(|path| match open_log(&path) {
        Ok(file) => Some((path, file)),
        Err(e) => {
            eprintln!("Cannot open log file {}: {}", path.display(), e);
            None
        }
    });

    let (writer, path) = match log_file {
        Some((path, file)) => (
            BoxMakeWriter::new(stderr.and(Mutex::new(file))),
            Some(path),
        ),
        None => (BoxMakeWriter::new(stderr), None),
    };

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init();

    path
}
