//! Observability: structured logging through `tracing`.
//!
//! Library code only emits `tracing` events; binaries call [`init`] once to
//! install a subscriber.

mod logging;

pub use logging::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig};

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static LOGGING_READY: OnceLock<()> = OnceLock::new();

/// Installs the global `tracing` subscriber.
///
/// Events go to stderr, or are appended to `config.file` when set, in the
/// configured format. See [`LoggingConfig::filter`] for level selection.
///
/// # Errors
///
/// Returns an error if logging has already been initialized or the log
/// file cannot be opened.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<()> {
    if LOGGING_READY.get().is_some() {
        return Err(Error::operation("logging_init", "logging already initialized"));
    }

    let (writer, ansi) = match &config.file {
        Some(path) => (BoxMakeWriter::new(open_log_file(path)?), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };
    let registry = tracing_subscriber::registry().with(config.filter(verbose));

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };
    installed.map_err(|e| Error::operation("logging_init", e))?;

    LOGGING_READY
        .set(())
        .map_err(|()| Error::operation("logging_init", "failed to mark logging initialized"))
}

/// Opens a log file for appending, creating parent directories.
fn open_log_file(path: &Path) -> Result<Mutex<std::fs::File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_log_dir", e))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(Mutex::new)
        .map_err(|e| Error::operation("open_log_file", format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs/nested/vaultscribe.log");

        let first = open_log_file(&path).unwrap();
        first.lock().unwrap().write_all(b"one\n").unwrap();
        let again = open_log_file(&path).unwrap();
        let mut file = again.lock().unwrap();
        file.write_all(b"two\n").unwrap();
        file.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_double_init_fails() {
        let config = LoggingConfig {
            level: "off".to_string(),
            ..LoggingConfig::default()
        };
        // another test binary thread may have installed a subscriber first
        let _ = init(&config, false);
        assert!(init(&config, false).is_err());
    }
}
