//! Structured logging.
//!
//! # Design Decisions
//! - Uses the `tracing` crate for structured logging
//! - `RUST_LOG` wins over the configured level when set
//! - Full format for development, compact format for dense production logs

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let (full, compact) = match config.log_format {
        LogFormat::Full => (Some(fmt::layer()), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(full)
        .with(compact)
        .try_init()
}

/// A bare level applies to this crate and the HTTP middleware; anything with
/// a `=` is taken as a complete filter.
fn default_directives(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("warn,newrelic_receiver={level},tower_http={level}")
    }
}
