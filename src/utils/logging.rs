//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for registration and counter events.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{PantryError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| PantryError::Config(format!("Failed to initialize logging: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log registration lifecycle actions
pub fn log_registration_action(registration_id: i64, action: &str, household_id: i64, details: Option<&str>) {
    info!(
        registration_id = registration_id,
        action = action,
        household_id = household_id,
        details = details,
        "Registration action performed"
    );
}

/// Log a public schedule counter adjustment
pub fn log_counter_change(level: &str, id: i64, delta: i32, applied: bool) {
    if applied {
        debug!(level = level, id = id, delta = delta, "Public schedule counter adjusted");
    } else {
        debug!(level = level, id = id, delta = delta, "Public schedule row missing, counter left untouched");
    }
}

/// Log a counter overwritten with a recounted value
pub fn log_counter_reset(level: &str, id: i64, reserved: i32, applied: bool) {
    if applied {
        debug!(level = level, id = id, reserved = reserved, "Public schedule counter reset");
    } else {
        debug!(level = level, id = id, reserved = reserved, "Public schedule row missing, nothing to reset");
    }
}

/// Log a denied access attempt
pub fn log_access_denied(household_id: Option<i64>, resource: &str, reason: &str) {
    warn!(
        household_id = household_id,
        resource = resource,
        reason = reason,
        "Access denied"
    );
}

/// Log staff actions
pub fn log_staff_action(user_id: i64, action: &str, details: Option<&str>) {
    warn!(
        user_id = user_id,
        action = action,
        details = details,
        "Staff action performed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}
