//! Logging setup for runs driven from binaries or notebooks.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{ErrorInfo, NestError};

/// Installs a global `tracing` subscriber writing to stderr and, when `outdir`
/// is given, appending to `{outdir}/{label}.log`.
///
/// `RUST_LOG` takes precedence over `level`. Installing a second subscriber is
/// a no-op, so repeated calls from tests or nested runs are harmless.
pub fn setup_logger(outdir: Option<&Path>, label: &str, level: &str) -> Result<(), NestError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| {
            NestError::Config(
                ErrorInfo::new("log-filter", err.to_string()).with_context("level", level),
            )
        })?;

    let file_layer = match outdir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|err| {
                NestError::Storage(
                    ErrorInfo::new("log-mkdir", err.to_string())
                        .with_context("path", dir.display().to_string()),
                )
            })?;
            let path = dir.join(format!("{label}.log"));
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|err| {
                    NestError::Storage(
                        ErrorInfo::new("log-open", err.to_string())
                            .with_context("path", path.display().to_string()),
                    )
                })?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();
    Ok(())
}
