//! Tracing setup for the `ngxlog` binary.
//!
//! Two stages: a scoped stderr subscriber while the config file is read
//! (so load-time warnings are not lost), then the process-wide subscriber
//! chosen by `log_level` / `log_format`.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use ngxlog_core::config::ExporterConfig;

/// Subscriber used before the configuration is known.
///
/// Only `WARN` and above, plain text on stderr. Install it with
/// `tracing::subscriber::set_default` and drop the guard before calling
/// [`init_tracing`].
pub fn bootstrap_subscriber() -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_max_level(Level::WARN)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish()
}

/// Install the global subscriber. `RUST_LOG`, when set, overrides `log_level`.
///
/// Fails on an unknown level or format, or if a global subscriber exists.
pub fn init_tracing(config: &ExporterConfig) -> Result<()> {
    let level = config.tracing_level().context("invalid log level")?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format.as_str() {
        "json" => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        "pretty" => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
        other => {
            return Err(anyhow::anyhow!(
                "unknown log format '{other}', expected 'json' or 'pretty'"
            ));
        }
    };
    installed.context("failed to install tracing subscriber")
}
