//! Shared application state
//!
//! Handed to every axum handler and middleware.

use std::sync::Arc;
use crate::config::Settings;
use crate::database::DatabaseService;
use crate::middleware::CallerRateLimiter;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<ServiceFactory>,
    /// Absent when the services run on non-Postgres stores
    pub database: Option<DatabaseService>,
    pub rate_limiter: Option<Arc<CallerRateLimiter>>,
}

impl AppState {
    pub fn new(settings: &Settings, services: ServiceFactory, database: Option<DatabaseService>) -> Result<Self> {
        let rate_limiter = if settings.rate_limit.enabled {
            Some(Arc::new(CallerRateLimiter::new(&settings.rate_limit)?))
        } else {
            None
        };

        Ok(Self {
            services: Arc::new(services),
            database,
            rate_limiter,
        })
    }
}
