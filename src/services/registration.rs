//! Registration lifecycle service
//!
//! Register, cancel and check-in for households, including capacity
//! evaluation, waitlisting and waitlist promotion. Capacity for internal
//! scopes (event, timeslot) is decided by the ledger from its own rows;
//! public schedule scopes take a seat on the `reserved` counters of the
//! public database before the ledger row is written.
//!
//! Both paths are safe across server processes: the ledger counts under a
//! database lock keyed by the scope and public reservations check capacity
//! inside the counter update. The in-process scope lock only queues local
//! requests for the same scope.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::config::FeaturesConfig;
use crate::database::traits::{EventCatalog, RegistrationLedger, ScheduleCounterStore};
use crate::models::{
    Admission, CapacityScope, CheckInRequest, Event, EventAvailability, EventTimeslot,
    NewRegistration, RegisterRequest, Registration, RegistrationStatus, ScopeAvailability,
    SeatReservation, TimeslotAvailability,
};
use crate::services::auth::Caller;
use crate::services::household::HouseholdResolver;
use crate::services::notification::NotificationService;
use crate::services::scope_lock::ScopeLocks;
use crate::utils::errors::{PantryError, Result};
use crate::utils::logging::{log_access_denied, log_registration_action};

#[derive(Clone)]
pub struct RegistrationService {
    events: Arc<dyn EventCatalog>,
    ledger: Arc<dyn RegistrationLedger>,
    counters: Arc<dyn ScheduleCounterStore>,
    households: HouseholdResolver,
    notifications: NotificationService,
    locks: ScopeLocks,
    promotion_syncs_public_counters: bool,
}

impl RegistrationService {
    pub fn new(
        events: Arc<dyn EventCatalog>,
        ledger: Arc<dyn RegistrationLedger>,
        counters: Arc<dyn ScheduleCounterStore>,
        households: HouseholdResolver,
        notifications: NotificationService,
        locks: ScopeLocks,
        features: &FeaturesConfig,
    ) -> Self {
        Self {
            events,
            ledger,
            counters,
            households,
            notifications,
            locks,
            promotion_syncs_public_counters: features.promotion_syncs_public_counters,
        }
    }

    /// Register the caller's household for an event
    pub async fn register(&self, caller: &Caller, request: RegisterRequest) -> Result<Registration> {
        debug!(event_id = request.event_id, "Registering household for event");

        let event = self
            .events
            .find_active_event(request.event_id)
            .await?
            .ok_or_else(|| PantryError::not_found("Event", request.event_id))?;

        let timeslot = match request.timeslot_id {
            Some(timeslot_id) => Some(
                self.events
                    .find_active_timeslot(timeslot_id, event.id)
                    .await?
                    .ok_or_else(|| PantryError::not_found("Timeslot", timeslot_id))?,
            ),
            None => None,
        };

        let household_id = self.households.resolve_or_provision(caller).await?;
        let attendees = self
            .households
            .validate_attendees(household_id, &request.attendees)
            .await?;

        let scope = CapacityScope::select(
            event.id,
            request.timeslot_id,
            request.public_event_slot_id,
            request.public_event_date_id,
        );
        let _guard = self.locks.acquire(scope).await;

        if let Some(existing) = self
            .ledger
            .find_active_for_event_and_household(event.id, household_id)
            .await?
        {
            debug!(registration_id = existing.id, household_id = household_id, "Active registration already exists");
            return Err(PantryError::bad_request("Already registered"));
        }

        let (admission, reservation) = self.admission_for(&scope, &event, timeslot.as_ref()).await?;

        let new_registration = NewRegistration {
            event_id: event.id,
            household_id,
            scope,
            timeslot_id: request.timeslot_id,
            public_event_slot_id: request.public_event_slot_id,
            public_event_date_id: request.public_event_date_id,
            admission,
            created_by: caller.user_id(),
            attendee_member_ids: attendees,
        };

        let created = self.ledger.create(new_registration).await;
        if created.is_err() && reservation == SeatReservation::Reserved {
            // Give back the seat taken for a row that was never written
            self.release_public_seat(&scope, None).await;
        }

        let registration = match created {
            Ok(registration) => registration,
            Err(e) if e.is_unique_violation() => {
                return Err(PantryError::bad_request("Already registered"));
            }
            Err(e) => return Err(e),
        };

        log_registration_action(
            registration.id,
            "register",
            household_id,
            Some(registration.status.as_str()),
        );
        Ok(registration)
    }

    /// Cancel a registration owned by the caller's household
    pub async fn cancel(&self, caller: &Caller, registration_id: i64) -> Result<Registration> {
        let registration = self.load_owned(caller, registration_id).await?;
        if registration.status == RegistrationStatus::Cancelled {
            return Ok(registration);
        }

        let scope = registration.scope();
        let _guard = self.locks.acquire(scope).await;

        let current = self.reload(registration_id).await?;
        if current.status == RegistrationStatus::Cancelled {
            return Ok(current);
        }

        let cancelled = self
            .ledger
            .update_status(current.id, current.status, RegistrationStatus::Cancelled)
            .await?
            .ok_or_else(|| PantryError::bad_request("Registration changed during cancellation"))?;

        log_registration_action(
            cancelled.id,
            "cancel",
            cancelled.household_id,
            Some(current.status.as_str()),
        );

        // Only seat holders were counted, so only they free a seat
        if current.status.holds_seat() {
            self.release_public_seat(&scope, Some(cancelled.id)).await;
            self.promote_next(&cancelled).await?;
        }

        Ok(cancelled)
    }

    /// Check in a confirmed registration and record the attendee count
    pub async fn check_in(&self, caller: &Caller, request: CheckInRequest) -> Result<Registration> {
        let registration = self.load_owned(caller, request.registration_id).await?;

        let _guard = self.locks.acquire(registration.scope()).await;
        let current = self.reload(registration.id).await?;

        match current.status {
            RegistrationStatus::Confirmed => {}
            RegistrationStatus::Cancelled => {
                return Err(PantryError::bad_request("Registration is cancelled"));
            }
            RegistrationStatus::Waitlisted => {
                return Err(PantryError::bad_request("Waitlisted registrations cannot be checked in"));
            }
            RegistrationStatus::CheckedIn => {
                return Err(PantryError::bad_request("Registration is already checked in"));
            }
        }

        let attendees = self
            .households
            .validate_attendees(current.household_id, &request.attendee_ids)
            .await?;
        let attendee_count = i32::try_from(attendees.len())
            .map_err(|_| PantryError::bad_request("Too many attendees"))?;

        let (checked_in, audit) = self
            .ledger
            .check_in(current.id, caller.user_id(), attendee_count)
            .await?
            .ok_or_else(|| PantryError::bad_request("Registration changed during check-in"))?;

        debug!(registration_id = checked_in.id, audit_id = audit.id, "Check-in audit recorded");
        let details = format!("attendees={}", attendee_count);
        log_registration_action(checked_in.id, "check_in", checked_in.household_id, Some(details.as_str()));
        Ok(checked_in)
    }

    /// All registrations of an event, oldest first
    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<Registration>> {
        self.ledger.list_for_event(event_id).await
    }

    /// Seat usage of an event and each of its active timeslots
    pub async fn event_availability(&self, event_id: i64) -> Result<EventAvailability> {
        let event = self
            .events
            .find_active_event(event_id)
            .await?
            .ok_or_else(|| PantryError::not_found("Event", event_id))?;

        let availability = self
            .scope_availability(&CapacityScope::Event(event.id), event.capacity)
            .await?;

        let mut timeslots = Vec::new();
        for timeslot in self.events.list_active_timeslots(event.id).await? {
            let availability = self
                .scope_availability(&CapacityScope::Timeslot(timeslot.id), timeslot.capacity)
                .await?;
            timeslots.push(TimeslotAvailability {
                timeslot_id: timeslot.id,
                starts_at: timeslot.starts_at,
                ends_at: timeslot.ends_at,
                availability,
            });
        }

        Ok(EventAvailability {
            event_id: event.id,
            name: event.name,
            availability,
            timeslots,
        })
    }

    async fn scope_availability(&self, scope: &CapacityScope, capacity: Option<i32>) -> Result<ScopeAvailability> {
        let confirmed = self.ledger.count_confirmed(scope).await?;
        let waitlisted = self.ledger.count_waitlisted(scope).await?;
        Ok(ScopeAvailability::new(capacity, confirmed, waitlisted))
    }

    /// Decide how the new row's status is settled. Public scopes take their
    /// seat here; a full counter means the row is waitlisted.
    async fn admission_for(
        &self,
        scope: &CapacityScope,
        event: &Event,
        timeslot: Option<&EventTimeslot>,
    ) -> Result<(Admission, SeatReservation)> {
        let capacity = match *scope {
            CapacityScope::Event(_) => event.capacity,
            CapacityScope::Timeslot(_) => timeslot.and_then(|t| t.capacity),
            CapacityScope::PublicSlot(_) | CapacityScope::PublicDate(_) => {
                let reservation = self.reserve_public_seat(scope).await?;
                if reservation == SeatReservation::Untracked {
                    warn!(scope = %scope, "Public schedule row not found, treating as unlimited");
                }
                debug!(scope = %scope, reservation = ?reservation, "Public seat reservation");

                let status = if reservation.admits() {
                    RegistrationStatus::Confirmed
                } else {
                    RegistrationStatus::Waitlisted
                };
                return Ok((Admission::Fixed(status), reservation));
            }
        };

        debug!(scope = %scope, capacity = ?capacity, "Ledger decides admission");
        Ok((Admission::WithinCapacity(capacity), SeatReservation::Untracked))
    }

    /// Confirm the oldest waitlisted row sharing the freed row's scope
    async fn promote_next(&self, freed: &Registration) -> Result<Option<Registration>> {
        let scope = freed.scope();
        let promoted = if scope.is_public() && self.promotion_syncs_public_counters {
            self.promote_with_public_seat(freed.event_id, &scope).await?
        } else {
            let capacity = self.events.scope_capacity(&scope).await?;
            self.ledger.promote_next(freed.event_id, &scope, capacity).await?
        };

        let Some(promoted) = promoted else {
            return Ok(None);
        };

        info!(
            registration_id = promoted.id,
            freed_registration_id = freed.id,
            scope = %scope,
            "Promoted registration from waitlist"
        );
        log_registration_action(promoted.id, "promote", promoted.household_id, None);
        self.notifications.dispatch_promotion(&promoted);

        Ok(Some(promoted))
    }

    /// Reserve the freed public seat for the next waitlisted row. Another
    /// process may have taken it already, in which case nobody is promoted.
    async fn promote_with_public_seat(&self, event_id: i64, scope: &CapacityScope) -> Result<Option<Registration>> {
        if self.ledger.next_waitlisted(event_id, scope).await?.is_none() {
            return Ok(None);
        }

        let reservation = match self.reserve_public_seat(scope).await {
            Ok(reservation) => reservation,
            Err(e) => {
                // Counter outage: promote anyway, reconciliation repairs the counter
                error!(scope = %scope, error = %e, "Public counter reservation failed during promotion");
                SeatReservation::Untracked
            }
        };
        if !reservation.admits() {
            debug!(scope = %scope, "Freed public seat already taken");
            return Ok(None);
        }

        let promoted = self.ledger.promote_next(event_id, scope, None).await;
        if reservation == SeatReservation::Reserved && !matches!(promoted, Ok(Some(_))) {
            self.release_public_seat(scope, None).await;
        }
        promoted
    }

    async fn reserve_public_seat(&self, scope: &CapacityScope) -> Result<SeatReservation> {
        match *scope {
            CapacityScope::PublicSlot(slot_id) => self.counters.reserve_slot(slot_id).await,
            CapacityScope::PublicDate(date_id) => self.counters.reserve_date(date_id).await,
            CapacityScope::Event(_) | CapacityScope::Timeslot(_) => Ok(SeatReservation::Untracked),
        }
    }

    /// Give a seat back to the public schedule. Failures are logged; counter
    /// reconciliation repairs drift.
    async fn release_public_seat(&self, scope: &CapacityScope, registration_id: Option<i64>) {
        let result = match *scope {
            CapacityScope::PublicSlot(slot_id) => self.counters.decrement_slot_and_date(slot_id).await,
            CapacityScope::PublicDate(date_id) => self.counters.decrement_date(date_id).await,
            CapacityScope::Event(_) | CapacityScope::Timeslot(_) => return,
        };

        if let Err(e) = result {
            error!(registration_id = ?registration_id, scope = %scope, error = %e, "Public counter decrement failed");
        }
    }

    async fn reload(&self, registration_id: i64) -> Result<Registration> {
        self.ledger
            .find_by_id(registration_id)
            .await?
            .ok_or_else(|| PantryError::not_found("Registration", registration_id))
    }

    /// Load a registration and make sure the caller's household owns it
    async fn load_owned(&self, caller: &Caller, registration_id: i64) -> Result<Registration> {
        let registration = self.reload(registration_id).await?;

        let household_id = self.households.resolve_existing(caller).await?;
        if household_id != Some(registration.household_id) {
            log_access_denied(household_id, "registration", "household mismatch");
            return Err(PantryError::forbidden("Registration belongs to another household"));
        }

        Ok(registration)
    }
}
