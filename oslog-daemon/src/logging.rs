//! Logging initialization for oslog-daemon.
//!
//! Configures `tracing-subscriber` based on the `[general]` section
//! of `OslogConfig`. Supports JSON structured logging and
//! human-readable pretty format, plus an optional log file that
//! always receives JSON lines.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;
use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

use oslog_core::config::GeneralConfig;

/// Initialize the global tracing subscriber.
///
/// Must be called exactly once, before any tracing macros are used.
///
/// # Arguments
///
/// * `config` - General configuration (log_level, log_format, log_file)
///
/// # Formats
///
/// * `"json"` - Machine-parseable JSON lines (default for production)
/// * `"pretty"` - Human-readable colored output (for development)
///
/// Console output goes to stderr.
pub fn init_tracing(config: &GeneralConfig) -> Result<()> {
    if !matches!(config.log_format.as_str(), "json" | "pretty") {
        return Err(anyhow::anyhow!(
            "unknown log format '{}', expected 'json' or 'pretty'",
            config.log_format
        ));
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let log_file = open_log_file(&config.log_file)?;

    // stdout is reserved for the record stream (sink.output = "-")
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer(&config.log_format, std::io::stderr))
        .with(file_layer(log_file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {}", e))?;

    Ok(())
}

/// Open the extra log destination, if one is configured.
///
/// The file is opened in append mode and created with mode 0640 on unix.
pub fn open_log_file(path: &str) -> Result<Option<File>> {
    if path.is_empty() {
        return Ok(None);
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!("failed to create log directory {}: {}", parent.display(), e)
        })?;
    }

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }

    let file = options
        .open(path)
        .map_err(|e| anyhow::anyhow!("failed to open log file {}: {}", path.display(), e))?;
    Ok(Some(file))
}

/// Console output layer in the configured format, written to `writer`.
fn console_layer<S, W>(format: &str, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if format == "pretty" {
        tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(writer)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .boxed()
    }
}

fn file_layer<S>(file: Option<File>) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    file.map(|file| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    })
}
