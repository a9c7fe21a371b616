//! Tracing subscriber initialisation
//!
//! The pipeline crates only emit `tracing` events. Applications call
//! [`init_tracing`] once at startup to print them.

use std::str::FromStr;

use authpipe_domain::impl_str_conversions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Directive used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Output format for log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, coloured
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl_str_conversions!(LogFormat {
    Pretty => "pretty",
    Json => "json",
});

impl LogFormat {
    /// Read the format from an environment variable, defaulting to
    /// [`LogFormat::Pretty`] when unset or unrecognised.
    #[must_use]
    pub fn from_env(key: &str) -> Self {
        std::env::var(key).ok().and_then(|raw| Self::from_str(&raw).ok()).unwrap_or_default()
    }
}

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
/// Returns `false` if a global subscriber was already installed, in which
/// case nothing changes.
pub fn init_tracing(format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_target(false).with_thread_ids(false).with_ansi(true))
            .try_init(),
    };

    result.is_ok()
}
