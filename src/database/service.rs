//! Database service layer
//!
//! Bundles the repositories of both databases behind one handle.

use crate::database::{
    DatabasePool, EventRepository, HouseholdRepository, PublicScheduleRepository,
    RegistrationRepository,
};
use crate::database::connection::health_check;
use crate::utils::errors::PantryError;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub events: EventRepository,
    pub households: HouseholdRepository,
    pub registrations: RegistrationRepository,
    pub public_schedule: PublicScheduleRepository,
    primary_pool: DatabasePool,
    public_pool: DatabasePool,
}

impl DatabaseService {
    pub fn new(primary_pool: DatabasePool, public_pool: DatabasePool) -> Self {
        Self {
            events: EventRepository::new(primary_pool.clone()),
            households: HouseholdRepository::new(primary_pool.clone()),
            registrations: RegistrationRepository::new(primary_pool.clone()),
            public_schedule: PublicScheduleRepository::new(public_pool.clone()),
            primary_pool,
            public_pool,
        }
    }

    /// Check both databases
    pub async fn health(&self) -> DatabaseHealth {
        DatabaseHealth {
            primary: report(health_check(&self.primary_pool).await, "primary"),
            public_schedule: report(health_check(&self.public_pool).await, "public_schedule"),
        }
    }

    pub async fn close(&self) {
        self.primary_pool.close().await;
        self.public_pool.close().await;
    }
}

fn report(result: Result<(), PantryError>, name: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(database = name, error = %e, "Database health check failed");
            false
        }
    }
}

/// Health of both databases
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct DatabaseHealth {
    pub primary: bool,
    pub public_schedule: bool,
}

impl DatabaseHealth {
    pub fn is_healthy(&self) -> bool {
        self.primary && self.public_schedule
    }
}
