//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;
pub mod service;
pub mod traits;

// Re-export commonly used database components
pub use connection::{DatabasePool, DatabaseConfig, create_pool, run_migrations, run_public_migrations, health_check};
pub use repositories::{EventRepository, HouseholdRepository, PublicScheduleRepository, RegistrationRepository};
pub use service::DatabaseService;
pub use traits::{EventCatalog, HouseholdDirectory, RegistrationLedger, ScheduleCounterStore};
