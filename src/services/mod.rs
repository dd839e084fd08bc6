//! Services module
//!
//! This module contains business logic services

pub mod auth;
pub mod household;
pub mod notification;
pub mod reconcile;
pub mod registration;
pub mod scope_lock;

// Re-export commonly used services
pub use auth::{AuthService, Caller, Claims};
pub use household::HouseholdResolver;
pub use notification::{NotificationService, PromotionNotice};
pub use reconcile::CounterReconciler;
pub use registration::RegistrationService;
pub use scope_lock::ScopeLocks;

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::traits::{EventCatalog, HouseholdDirectory, RegistrationLedger, ScheduleCounterStore};
use crate::database::DatabaseService;
use crate::utils::errors::Result;

/// Storage handles the services are built on
#[derive(Clone)]
pub struct Stores {
    pub events: Arc<dyn EventCatalog>,
    pub ledger: Arc<dyn RegistrationLedger>,
    pub counters: Arc<dyn ScheduleCounterStore>,
    pub households: Arc<dyn HouseholdDirectory>,
}

impl Stores {
    /// Postgres-backed stores from both database pools
    pub fn postgres(database: &DatabaseService) -> Self {
        Self {
            events: Arc::new(database.events.clone()),
            ledger: Arc::new(database.registrations.clone()),
            counters: Arc::new(database.public_schedule.clone()),
            households: Arc::new(database.households.clone()),
        }
    }
}

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub registration_service: RegistrationService,
    pub reconciler: CounterReconciler,
    pub notification_service: NotificationService,
    /// Scope locks shared by the lifecycle service and the reconciler
    pub scope_locks: ScopeLocks,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, stores: Stores) -> Result<Self> {
        let notification_service = NotificationService::new(&settings.notifications)?;
        Ok(Self::with_notifications(settings, stores, notification_service))
    }

    /// Build the services around an already configured notifier
    pub fn with_notifications(
        settings: &Settings,
        stores: Stores,
        notification_service: NotificationService,
    ) -> Self {
        let auth_service = AuthService::new(&settings.auth);
        let scope_locks = ScopeLocks::new();
        let registration_service = RegistrationService::new(
            stores.events,
            stores.ledger.clone(),
            stores.counters.clone(),
            HouseholdResolver::new(stores.households),
            notification_service.clone(),
            scope_locks.clone(),
            &settings.features,
        );
        let reconciler = CounterReconciler::new(stores.ledger, stores.counters, scope_locks.clone());

        Self {
            auth_service,
            registration_service,
            reconciler,
            notification_service,
            scope_locks,
        }
    }
}
