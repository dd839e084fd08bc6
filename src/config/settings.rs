//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub public_database: PublicDatabaseConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
    pub notifications: NotificationConfig,
    pub features: FeaturesConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
}

/// Primary registration database
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Public schedule database (externally owned)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublicDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Apply the bundled public schedule migrations on startup (local setups only)
    pub run_migrations: bool,
}

/// Caller authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub guest_tokens_enabled: bool,
    pub staff_roles: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    pub json: bool,
}

/// Per-caller rate limiting for mutating endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub requests_per_minute: u32,
    pub burst: u32,
}

/// Waitlist promotion notifications
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    pub timeout_seconds: u64,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    /// Increment public schedule counters for rows promoted off the waitlist
    pub promotion_syncs_public_counters: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::from_file("config")
    }

    /// Load settings layered over the defaults from the named file and `PANTRY__*` variables
    pub fn from_file(name: &str) -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name(name).required(false))
            .add_source(
                config::Environment::with_prefix("PANTRY")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.staff_roles")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::PantryError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/pantry".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            public_database: PublicDatabaseConfig {
                url: "postgresql://localhost/pantry_public".to_string(),
                max_connections: 5,
                run_migrations: false,
            },
            auth: AuthConfig {
                jwt_secret: String::new(),
                guest_tokens_enabled: true,
                staff_roles: vec!["staff".to_string(), "admin".to_string()],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: "pantrydesk.log".to_string(),
                json: false,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                requests_per_minute: 30,
                burst: 10,
            },
            notifications: NotificationConfig {
                webhook_url: None,
                timeout_seconds: 5,
            },
            features: FeaturesConfig {
                promotion_syncs_public_counters: true,
            },
        }
    }
}
