//! Tracing subscriber setup.
//!
//! Logs go to a file in the data directory because the terminal UI owns
//! stdout. `RUST_LOG` overrides the default `info` level.

use crate::error::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, appending to `log_file_path`.
pub fn init_logging(log_file_path: &Path) -> Result<()> {
    if let Some(dir) = log_file_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    // Only the first call in a process installs a subscriber.
    let _ = build_subscriber(log_file).try_init();
    Ok(())
}

/// File-backed subscriber shared by the binary and the tests.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
