//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{PantryError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_server_config(&settings.server)?;
    validate_database_config(&settings.database)?;
    validate_public_database_config(&settings.public_database)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;
    validate_rate_limit_config(&settings.rate_limit)?;
    validate_notification_config(&settings.notifications)?;

    Ok(())
}

fn validate_server_config(config: &super::ServerConfig) -> Result<()> {
    config.bind_address.parse::<std::net::SocketAddr>().map_err(|_| {
        PantryError::Config(format!("Invalid bind address: {}", config.bind_address))
    })?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PantryError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(PantryError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(PantryError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

fn validate_public_database_config(config: &super::PublicDatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(PantryError::Config(
            "Public schedule database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(PantryError::Config(
            "Public schedule max connections must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.jwt_secret.len() < 16 {
        return Err(PantryError::Config(
            "JWT secret must be at least 16 characters".to_string()
        ));
    }

    if config.staff_roles.is_empty() {
        return Err(PantryError::Config(
            "At least one staff role must be configured".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(PantryError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(PantryError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

fn validate_rate_limit_config(config: &super::RateLimitConfig) -> Result<()> {
    if config.enabled && (config.requests_per_minute == 0 || config.burst == 0) {
        return Err(PantryError::Config(
            "Rate limit requests and burst must be greater than 0".to_string()
        ));
    }

    Ok(())
}

fn validate_notification_config(config: &super::NotificationConfig) -> Result<()> {
    if let Some(ref webhook_url) = config.webhook_url {
        let url = url::Url::parse(webhook_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PantryError::Config(
                format!("Unsupported webhook scheme: {}", url.scheme())
            ));
        }
    }

    if config.timeout_seconds == 0 {
        return Err(PantryError::Config(
            "Notification timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}
