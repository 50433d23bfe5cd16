//! Tracing subscriber setup
//!
//! JSON or human-readable output on stderr, optionally duplicated to a log
//! file. `RUST_LOG` takes precedence over the computed level.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How the binary wants its logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit one JSON object per event
    pub json_format: bool,
    /// Append events to this file as well
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "spotremote=info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl LoggingOptions {
    /// Options derived from the global CLI flags
    pub fn from_flags(verbose: bool, json_format: bool, file_path: Option<PathBuf>) -> Self {
        let level = if verbose {
            "spotremote=debug"
        } else {
            "spotremote=info"
        };
        Self {
            level: level.to_string(),
            json_format,
            file_path,
        }
    }
}

/// Installs the global subscriber
///
/// # Errors
///
/// Fails when the filter directive is invalid or the log file cannot be
/// opened.
///
/// # Examples
///
/// ```no_run
/// use spotremote::logging::{init_logging, LoggingOptions};
///
/// init_logging(&LoggingOptions::default()).unwrap();
/// tracing::info!("ready");
/// ```
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.level))
        .with_context(|| format!("Invalid log filter '{}'", options.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &options.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?,
        )),
        None => None,
    };

    if options.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);

        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(file);
                registry.with(stderr_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stderr_layer).try_init()?,
        }
    } else {
        let stderr_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr);

        match file {
            Some(file) => {
                let file_layer = fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .with_writer(file);
                registry.with(stderr_layer).with(file_layer).try_init()?;
            }
            None => registry.with(stderr_layer).try_init()?,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "spotremote=info");
        assert!(!options.json_format);
        assert!(options.file_path.is_none());
    }

    #[test]
    fn test_verbose_flag_raises_level() {
        let options = LoggingOptions::from_flags(true, true, Some(PathBuf::from("/tmp/s.log")));
        assert_eq!(options.level, "spotremote=debug");
        assert!(options.json_format);
        assert_eq!(options.file_path, Some(PathBuf::from("/tmp/s.log")));
    }

    #[test]
    fn test_unopenable_log_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let options = LoggingOptions {
            file_path: Some(dir.path().join("missing").join("log.txt")),
            ..LoggingOptions::default()
        };
        assert!(init_logging(&options).is_err());
    }
}
