//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ReceiverConfig → Result<(), Vec<InvalidSetting>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ReceiverConfig;

/// One setting that failed semantic validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSetting {
    /// Dotted path of the setting (e.g. `listener.bind_address`).
    pub field: &'static str,
    pub message: String,
}

impl InvalidSetting {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for InvalidSetting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every setting, collecting all problems.
pub fn validate_config(config: &ReceiverConfig) -> Result<(), Vec<InvalidSetting>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(InvalidSetting::new(
            "listener.bind_address",
            format!("{:?} is not a socket address: {}", config.listener.bind_address, e),
        ));
    }
    if config.listener.max_concurrent_requests == 0 {
        errors.push(InvalidSetting::new(
            "listener.max_concurrent_requests",
            "must be greater than zero",
        ));
    }

    if !config.protocol.path.starts_with('/') {
        errors.push(InvalidSetting::new("protocol.path", "must start with '/'"));
    }
    if let Some(host) = &config.protocol.redirect_host {
        if host.trim().is_empty() {
            errors.push(InvalidSetting::new(
                "protocol.redirect_host",
                "must not be empty when set",
            ));
        }
    }

    if config.limits.max_body_size == 0 {
        errors.push(InvalidSetting::new(
            "limits.max_body_size",
            "must be greater than zero",
        ));
    }

    if config.timeouts.shutdown_secs == 0 {
        errors.push(InvalidSetting::new(
            "timeouts.shutdown_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled {
        if let Err(e) = config.observability.metrics_address.parse::<SocketAddr>() {
            errors.push(InvalidSetting::new(
                "observability.metrics_address",
                format!(
                    "{:?} is not a socket address: {}",
                    config.observability.metrics_address, e
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
