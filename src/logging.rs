//! `tracing` setup.
//!
//! Stdout belongs to the terminal while the compositor runs, so logs go to a
//! file. The filter defaults to `cellframe=info` and honors `RUST_LOG`.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;
use crate::error::{Error, Result};

const DEFAULT_FILTER: &str = "cellframe=info";

/// Install a global fmt subscriber appending to `path`.
pub fn init_file_logging(path: impl AsRef<Path>) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| Error::Logging(err.to_string()))
}

/// Install file logging when `CELLFRAME_LOG` names a file.
///
/// Returns `Ok(false)` when logging is not configured.
pub fn init_from_env(config: &EnvConfig) -> Result<bool> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(false);
    };
    init_file_logging(path)?;
    Ok(true)
}
