//! Storage seams used by the registration services
//!
//! The Postgres repositories implement these traits; services only depend on
//! the traits so each store can be swapped independently.

use async_trait::async_trait;
use crate::models::{
    CapacityScope, CheckInAudit, CreateHouseholdRequest, Event, EventTimeslot, Household,
    NewRegistration, Registration, RegistrationStatus, SeatReservation,
};
use crate::utils::errors::Result;

/// Read access to events and timeslots
#[async_trait]
pub trait EventCatalog: Send + Sync {
    async fn find_active_event(&self, event_id: i64) -> Result<Option<Event>>;

    /// Timeslot matching both ids, only when active
    async fn find_active_timeslot(&self, timeslot_id: i64, event_id: i64) -> Result<Option<EventTimeslot>>;

    async fn list_active_timeslots(&self, event_id: i64) -> Result<Vec<EventTimeslot>>;

    /// Capacity of an event or timeslot scope whether or not it is still
    /// active. Public scopes and missing rows are unlimited.
    async fn scope_capacity(&self, scope: &CapacityScope) -> Result<Option<i32>>;
}

/// Registration rows, attendee rows and the check-in audit log
#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>>;

    /// Any confirmed, waitlisted or checked-in row for the pair
    async fn find_active_for_event_and_household(&self, event_id: i64, household_id: i64) -> Result<Option<Registration>>;

    /// Seat-holding rows (confirmed or checked in) of the scope
    async fn count_confirmed(&self, scope: &CapacityScope) -> Result<i64>;

    async fn count_waitlisted(&self, scope: &CapacityScope) -> Result<i64>;

    /// Insert the row and its attendees. With `Admission::WithinCapacity`
    /// the seat count and the insert happen under a lock keyed by the scope,
    /// shared by every process writing the ledger. A second active row for
    /// the same household and event fails with a unique violation.
    async fn create(&self, registration: NewRegistration) -> Result<Registration>;

    /// Move `id` from `expected` to `status`. Returns `None` when the row is
    /// no longer in `expected`.
    async fn update_status(&self, id: i64, expected: RegistrationStatus, status: RegistrationStatus) -> Result<Option<Registration>>;

    /// Oldest waitlisted row of the scope, by creation time then id
    async fn next_waitlisted(&self, event_id: i64, scope: &CapacityScope) -> Result<Option<Registration>>;

    /// Confirm the oldest waitlisted row of the scope if its seat-holding
    /// rows are below `capacity`, under the same scope lock as `create`
    async fn promote_next(&self, event_id: i64, scope: &CapacityScope, capacity: Option<i32>) -> Result<Option<Registration>>;

    async fn list_for_event(&self, event_id: i64) -> Result<Vec<Registration>>;

    /// Move a confirmed row to checked-in and append its audit row, both or
    /// neither. Returns `None` when the row is no longer confirmed.
    async fn check_in(&self, registration_id: i64, created_by: Option<i64>, attendee_count: i32) -> Result<Option<(Registration, CheckInAudit)>>;

    /// Seat-holding rows per public slot, including slots whose rows are all cancelled
    async fn public_slot_seat_counts(&self) -> Result<Vec<(i64, i64)>>;

    /// Seat-holding rows scoped directly to a public date
    async fn public_date_seat_counts(&self) -> Result<Vec<(i64, i64)>>;
}

/// Reserved counters of the public schedule hierarchy
#[async_trait]
pub trait ScheduleCounterStore: Send + Sync {
    /// Take a seat on the slot unless it is at capacity, then bump its
    /// owning date. The capacity check is part of the slot update.
    async fn reserve_slot(&self, slot_id: i64) -> Result<SeatReservation>;

    /// Give a slot seat back and mirror it on the owning date, clamped at
    /// zero. Missing rows stop propagation.
    async fn decrement_slot_and_date(&self, slot_id: i64) -> Result<()>;

    /// Take a seat on the date unless it is at capacity
    async fn reserve_date(&self, date_id: i64) -> Result<SeatReservation>;

    async fn decrement_date(&self, date_id: i64) -> Result<()>;

    /// Walk slot -> hour -> date
    async fn date_for_slot(&self, slot_id: i64) -> Result<Option<i64>>;

    /// Overwrite a slot counter. Returns false when the slot does not exist.
    async fn set_slot_reserved(&self, slot_id: i64, reserved: i32) -> Result<bool>;

    async fn set_date_reserved(&self, date_id: i64, reserved: i32) -> Result<bool>;
}

/// Household lookup and minimal provisioning
#[async_trait]
pub trait HouseholdDirectory: Send + Sync {
    async fn find_by_owner(&self, user_id: i64) -> Result<Option<Household>>;

    async fn find_by_guest_token(&self, token: &str) -> Result<Option<Household>>;

    async fn create_minimal(&self, request: CreateHouseholdRequest) -> Result<Household>;

    async fn member_ids(&self, household_id: i64) -> Result<Vec<i64>>;
}
