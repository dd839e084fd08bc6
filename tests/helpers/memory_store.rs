//! In-memory stores for service-level tests
//!
//! One `MemoryStore` implements every storage trait so tests can seed events,
//! households and public schedule rows, run the services, then inspect the
//! resulting rows and counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use PantryDesk::database::traits::{EventCatalog, HouseholdDirectory, RegistrationLedger, ScheduleCounterStore};
use PantryDesk::models::{
    decremented, has_capacity, CapacityCounter, CapacityScope, CheckInAudit, CreateHouseholdRequest,
    Event, EventTimeslot, Household, NewRegistration, Registration, RegistrationStatus,
    SeatReservation,
};
use PantryDesk::services::Stores;
use PantryDesk::{PantryError, Result};

#[derive(Debug, Clone, Copy)]
pub struct SlotRow {
    pub hour_id: Option<i64>,
    pub counter: CapacityCounter,
}

#[derive(Default)]
struct Inner {
    events: HashMap<i64, Event>,
    timeslots: HashMap<i64, EventTimeslot>,
    households: HashMap<i64, Household>,
    members: HashMap<i64, Vec<i64>>,
    registrations: Vec<Registration>,
    attendees: HashMap<i64, Vec<i64>>,
    audits: Vec<CheckInAudit>,
    slots: HashMap<i64, SlotRow>,
    hours: HashMap<i64, Option<i64>>,
    dates: HashMap<i64, CapacityCounter>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    fail_counter_writes: Arc<AtomicBool>,
    fail_audit_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stores(&self) -> Stores {
        let store = Arc::new(self.clone());
        Stores {
            events: store.clone(),
            ledger: store.clone(),
            counters: store.clone(),
            households: store,
        }
    }

    pub fn add_event(&self, capacity: Option<i32>) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        inner.events.insert(
            id,
            Event {
                id,
                name: format!("Distribution {}", id),
                starts_at: Some(now + Duration::days(1)),
                ends_at: Some(now + Duration::days(1) + Duration::hours(3)),
                capacity,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    pub fn deactivate_event(&self, event_id: i64) {
        if let Some(event) = self.inner.lock().unwrap().events.get_mut(&event_id) {
            event.is_active = false;
        }
    }

    pub fn add_timeslot(&self, event_id: i64, capacity: Option<i32>) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        inner.timeslots.insert(
            id,
            EventTimeslot {
                id,
                event_id,
                starts_at: now + Duration::days(1),
                ends_at: now + Duration::days(1) + Duration::minutes(30),
                capacity,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Household owned by a signed-in user
    pub fn add_household(&self, owner_user_id: i64) -> i64 {
        self.insert_household(Some(owner_user_id), None)
    }

    pub fn add_guest_household(&self, guest_token: &str) -> i64 {
        self.insert_household(None, Some(guest_token.to_string()))
    }

    fn insert_household(&self, owner_user_id: Option<i64>, guest_token: Option<String>) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        let now = Utc::now();
        inner.households.insert(
            id,
            Household {
                id,
                name: format!("Household {}", id),
                owner_user_id,
                guest_token,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Extra member of a household
    pub fn add_member(&self, household_id: i64) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        inner.members.entry(household_id).or_default().push(id);
        id
    }

    pub fn add_public_date(&self, capacity: Option<i32>, reserved: i32) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id();
        inner.dates.insert(id, CapacityCounter { capacity, reserved });
        id
    }

    /// Slot under a fresh hour of `date_id`
    pub fn add_public_slot(&self, date_id: Option<i64>, capacity: Option<i32>, reserved: i32) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        let hour_id = inner.next_id();
        inner.hours.insert(hour_id, date_id);
        let id = inner.next_id();
        inner.slots.insert(
            id,
            SlotRow {
                hour_id: Some(hour_id),
                counter: CapacityCounter { capacity, reserved },
            },
        );
        id
    }

    pub fn slot(&self, slot_id: i64) -> Option<CapacityCounter> {
        self.inner.lock().unwrap().slots.get(&slot_id).map(|s| s.counter)
    }

    pub fn date(&self, date_id: i64) -> Option<CapacityCounter> {
        self.inner.lock().unwrap().dates.get(&date_id).copied()
    }

    pub fn set_slot_counter(&self, slot_id: i64, reserved: i32) {
        if let Some(slot) = self.inner.lock().unwrap().slots.get_mut(&slot_id) {
            slot.counter.reserved = reserved;
        }
    }

    pub fn registration(&self, id: i64) -> Option<Registration> {
        self.inner.lock().unwrap().registrations.iter().find(|r| r.id == id).cloned()
    }

    pub fn registrations(&self) -> Vec<Registration> {
        self.inner.lock().unwrap().registrations.clone()
    }

    pub fn count_with_status(&self, status: RegistrationStatus) -> usize {
        self.inner
            .lock()
            .unwrap()
            .registrations
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    pub fn attendees_of(&self, registration_id: i64) -> Vec<i64> {
        self.inner
            .lock()
            .unwrap()
            .attendees
            .get(&registration_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn members_of(&self, household_id: i64) -> Vec<i64> {
        self.inner
            .lock()
            .unwrap()
            .members
            .get(&household_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn audits(&self) -> Vec<CheckInAudit> {
        self.inner.lock().unwrap().audits.clone()
    }

    pub fn household_count(&self) -> usize {
        self.inner.lock().unwrap().households.len()
    }

    pub fn household_of_owner(&self, user_id: i64) -> Option<Household> {
        self.inner
            .lock()
            .unwrap()
            .households
            .values()
            .find(|h| h.owner_user_id == Some(user_id))
            .cloned()
    }

    /// Make every public counter write fail, as if the public database were down
    pub fn fail_counter_writes(&self, fail: bool) {
        self.fail_counter_writes.store(fail, Ordering::SeqCst);
    }

    /// Make audit inserts fail, rolling back the check-in they belong to
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    fn check_counter_writes(&self) -> Result<()> {
        if self.fail_counter_writes.load(Ordering::SeqCst) {
            return Err(PantryError::Config("public schedule unavailable".to_string()));
        }
        Ok(())
    }

    fn adjust_slot(inner: &mut Inner, slot_id: i64, delta: i32) -> Option<i64> {
        let slot = inner.slots.get_mut(&slot_id)?;
        slot.counter.reserved = if delta < 0 {
            decremented(slot.counter.reserved)
        } else {
            slot.counter.reserved + delta
        };
        slot.hour_id
    }

    fn adjust_date(inner: &mut Inner, date_id: i64, delta: i32) {
        if let Some(date) = inner.dates.get_mut(&date_id) {
            date.reserved = if delta < 0 {
                decremented(date.reserved)
            } else {
                date.reserved + delta
            };
        }
    }

    fn reserve(counter: &mut CapacityCounter) -> bool {
        if !has_capacity(counter.capacity, i64::from(counter.reserved)) {
            return false;
        }
        counter.reserved += 1;
        true
    }

    fn adjust_slot_and_date(&self, slot_id: i64, delta: i32) -> Result<()> {
        self.check_counter_writes()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(hour_id) = Self::adjust_slot(&mut inner, slot_id, delta) else {
            return Ok(());
        };
        if let Some(Some(date_id)) = inner.hours.get(&hour_id).copied() {
            Self::adjust_date(&mut inner, date_id, delta);
        }
        Ok(())
    }
}

fn in_scope(registration: &Registration, scope: &CapacityScope) -> bool {
    registration.scope() == *scope
}

#[async_trait]
impl EventCatalog for MemoryStore {
    async fn find_active_event(&self, event_id: i64) -> Result<Option<Event>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.get(&event_id).filter(|e| e.is_active).cloned())
    }

    async fn find_active_timeslot(&self, timeslot_id: i64, event_id: i64) -> Result<Option<EventTimeslot>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .timeslots
            .get(&timeslot_id)
            .filter(|t| t.event_id == event_id && t.is_active)
            .cloned())
    }

    async fn list_active_timeslots(&self, event_id: i64) -> Result<Vec<EventTimeslot>> {
        let inner = self.inner.lock().unwrap();
        let mut timeslots: Vec<EventTimeslot> = inner
            .timeslots
            .values()
            .filter(|t| t.event_id == event_id && t.is_active)
            .cloned()
            .collect();
        timeslots.sort_by_key(|t| t.id);
        Ok(timeslots)
    }

    async fn scope_capacity(&self, scope: &CapacityScope) -> Result<Option<i32>> {
        let inner = self.inner.lock().unwrap();
        Ok(match *scope {
            CapacityScope::Event(id) => inner.events.get(&id).and_then(|e| e.capacity),
            CapacityScope::Timeslot(id) => inner.timeslots.get(&id).and_then(|t| t.capacity),
            CapacityScope::PublicSlot(_) | CapacityScope::PublicDate(_) => None,
        })
    }
}

#[async_trait]
impl RegistrationLedger for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>> {
        Ok(self.registration(id))
    }

    async fn find_active_for_event_and_household(&self, event_id: i64, household_id: i64) -> Result<Option<Registration>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .registrations
            .iter()
            .find(|r| r.event_id == event_id && r.household_id == household_id && r.status.is_active())
            .cloned())
    }

    async fn count_confirmed(&self, scope: &CapacityScope) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .registrations
            .iter()
            .filter(|r| in_scope(r, scope) && r.status.holds_seat())
            .count() as i64)
    }

    async fn count_waitlisted(&self, scope: &CapacityScope) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .registrations
            .iter()
            .filter(|r| in_scope(r, scope) && r.status == RegistrationStatus::Waitlisted)
            .count() as i64)
    }

    async fn create(&self, registration: NewRegistration) -> Result<Registration> {
        let mut inner = self.inner.lock().unwrap();
        let duplicate = inner.registrations.iter().any(|r| {
            r.event_id == registration.event_id
                && r.household_id == registration.household_id
                && r.status.is_active()
        });
        if duplicate {
            return Err(PantryError::bad_request("Already registered"));
        }

        // Counting and inserting under one mutex mirrors the scope lock
        let taken = inner
            .registrations
            .iter()
            .filter(|r| in_scope(r, &registration.scope) && r.status.holds_seat())
            .count() as i64;
        let status = registration.admission.status_for(taken);

        let id = inner.next_id();
        let now = Utc::now();
        let row = Registration {
            id,
            event_id: registration.event_id,
            household_id: registration.household_id,
            timeslot_id: registration.timeslot_id,
            public_event_slot_id: registration.public_event_slot_id,
            public_event_date_id: registration.public_event_date_id,
            scope_kind: registration.scope.kind(),
            status,
            created_by: registration.created_by,
            created_at: now,
            updated_at: now,
        };
        inner.registrations.push(row.clone());
        inner.attendees.insert(id, registration.attendee_member_ids);
        Ok(row)
    }

    async fn update_status(&self, id: i64, expected: RegistrationStatus, status: RegistrationStatus) -> Result<Option<Registration>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.registrations.iter_mut().find(|r| r.id == id && r.status == expected) else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn next_waitlisted(&self, event_id: i64, scope: &CapacityScope) -> Result<Option<Registration>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .registrations
            .iter()
            .filter(|r| {
                r.event_id == event_id && in_scope(r, scope) && r.status == RegistrationStatus::Waitlisted
            })
            .min_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn promote_next(&self, event_id: i64, scope: &CapacityScope, capacity: Option<i32>) -> Result<Option<Registration>> {
        let mut inner = self.inner.lock().unwrap();
        let taken = inner
            .registrations
            .iter()
            .filter(|r| in_scope(r, scope) && r.status.holds_seat())
            .count() as i64;
        if !has_capacity(capacity, taken) {
            return Ok(None);
        }

        let Some(next) = inner
            .registrations
            .iter_mut()
            .filter(|r| {
                r.event_id == event_id && in_scope(r, scope) && r.status == RegistrationStatus::Waitlisted
            })
            .min_by_key(|r| (r.created_at, r.id))
        else {
            return Ok(None);
        };
        next.status = RegistrationStatus::Confirmed;
        next.updated_at = Utc::now();
        Ok(Some(next.clone()))
    }

    async fn list_for_event(&self, event_id: i64) -> Result<Vec<Registration>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn check_in(&self, registration_id: i64, created_by: Option<i64>, attendee_count: i32) -> Result<Option<(Registration, CheckInAudit)>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(index) = inner
            .registrations
            .iter()
            .position(|r| r.id == registration_id && r.status == RegistrationStatus::Confirmed)
        else {
            return Ok(None);
        };
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            return Err(PantryError::Config("audit table unavailable".to_string()));
        }

        let id = inner.next_id();
        let now = Utc::now();
        let row = &mut inner.registrations[index];
        row.status = RegistrationStatus::CheckedIn;
        row.updated_at = now;
        let registration = row.clone();

        let audit = CheckInAudit {
            id,
            registration_id,
            created_by,
            attendee_count,
            created_at: now,
        };
        inner.audits.push(audit.clone());
        Ok(Some((registration, audit)))
    }

    async fn public_slot_seat_counts(&self) -> Result<Vec<(i64, i64)>> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for registration in &inner.registrations {
            if let CapacityScope::PublicSlot(slot_id) = registration.scope() {
                let seats = counts.entry(slot_id).or_default();
                if registration.status.holds_seat() {
                    *seats += 1;
                }
            }
        }
        Ok(counts.into_iter().collect())
    }

    async fn public_date_seat_counts(&self) -> Result<Vec<(i64, i64)>> {
        let inner = self.inner.lock().unwrap();
        let mut counts: HashMap<i64, i64> = HashMap::new();
        for registration in &inner.registrations {
            if let CapacityScope::PublicDate(date_id) = registration.scope() {
                let seats = counts.entry(date_id).or_default();
                if registration.status.holds_seat() {
                    *seats += 1;
                }
            }
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl ScheduleCounterStore for MemoryStore {
    async fn reserve_slot(&self, slot_id: i64) -> Result<SeatReservation> {
        self.check_counter_writes()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(slot) = inner.slots.get_mut(&slot_id) else {
            return Ok(SeatReservation::Untracked);
        };
        if !Self::reserve(&mut slot.counter) {
            return Ok(SeatReservation::Full);
        }
        let hour_id = slot.hour_id;
        if let Some(Some(date_id)) = hour_id.and_then(|h| inner.hours.get(&h).copied()) {
            Self::adjust_date(&mut inner, date_id, 1);
        }
        Ok(SeatReservation::Reserved)
    }

    async fn decrement_slot_and_date(&self, slot_id: i64) -> Result<()> {
        self.adjust_slot_and_date(slot_id, -1)
    }

    async fn reserve_date(&self, date_id: i64) -> Result<SeatReservation> {
        self.check_counter_writes()?;
        let mut inner = self.inner.lock().unwrap();
        let Some(date) = inner.dates.get_mut(&date_id) else {
            return Ok(SeatReservation::Untracked);
        };
        if Self::reserve(date) {
            Ok(SeatReservation::Reserved)
        } else {
            Ok(SeatReservation::Full)
        }
    }

    async fn decrement_date(&self, date_id: i64) -> Result<()> {
        self.check_counter_writes()?;
        Self::adjust_date(&mut self.inner.lock().unwrap(), date_id, -1);
        Ok(())
    }

    async fn date_for_slot(&self, slot_id: i64) -> Result<Option<i64>> {
        let inner = self.inner.lock().unwrap();
        let hour_id = inner.slots.get(&slot_id).and_then(|s| s.hour_id);
        Ok(hour_id.and_then(|h| inner.hours.get(&h).copied().flatten()))
    }

    async fn set_slot_reserved(&self, slot_id: i64, reserved: i32) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        Ok(match inner.slots.get_mut(&slot_id) {
            Some(slot) => {
                slot.counter.reserved = reserved.max(0);
                true
            }
            None => false,
        })
    }

    async fn set_date_reserved(&self, date_id: i64, reserved: i32) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        Ok(match inner.dates.get_mut(&date_id) {
            Some(date) => {
                date.reserved = reserved.max(0);
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl HouseholdDirectory for MemoryStore {
    async fn find_by_owner(&self, user_id: i64) -> Result<Option<Household>> {
        Ok(self.household_of_owner(user_id))
    }

    async fn find_by_guest_token(&self, token: &str) -> Result<Option<Household>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .households
            .values()
            .find(|h| h.guest_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create_minimal(&self, request: CreateHouseholdRequest) -> Result<Household> {
        let mut inner = self.inner.lock().unwrap();
        if inner.households.values().any(|h| h.owner_user_id == Some(request.owner_user_id)) {
            return Err(PantryError::bad_request("Household already exists"));
        }
        let id = inner.next_id();
        let now = Utc::now();
        let household = Household {
            id,
            name: request.name,
            owner_user_id: Some(request.owner_user_id),
            guest_token: None,
            created_at: now,
            updated_at: now,
        };
        inner.households.insert(id, household.clone());
        let head_id = inner.next_id();
        inner.members.insert(id, vec![head_id]);
        Ok(household)
    }

    async fn member_ids(&self, household_id: i64) -> Result<Vec<i64>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.members.get(&household_id).cloned().unwrap_or_default())
    }
}
