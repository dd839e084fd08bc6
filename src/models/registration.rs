//! Registration model
//!
//! A registration ties one household to one event. Its capacity scope is
//! picked once at creation and never changes afterwards.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use crate::models::public_schedule::has_capacity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Confirmed,
    Waitlisted,
    Cancelled,
    CheckedIn,
}

impl RegistrationStatus {
    /// Statuses that block a second registration for the same household and event
    pub fn is_active(self) -> bool {
        !matches!(self, RegistrationStatus::Cancelled)
    }

    /// Statuses that occupy a seat and were counted when they entered `confirmed`
    pub fn holds_seat(self) -> bool {
        matches!(self, RegistrationStatus::Confirmed | RegistrationStatus::CheckedIn)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Waitlisted => "waitlisted",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::CheckedIn => "checked_in",
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "capacity_scope_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Event,
    Timeslot,
    PublicSlot,
    PublicDate,
}

/// The resource whose capacity a registration consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CapacityScope {
    Event(i64),
    Timeslot(i64),
    PublicSlot(i64),
    PublicDate(i64),
}

impl CapacityScope {
    /// Pick the scope from the supplied selectors.
    ///
    /// Priority: public slot, timeslot, public date, then the event itself.
    pub fn select(
        event_id: i64,
        timeslot_id: Option<i64>,
        public_event_slot_id: Option<i64>,
        public_event_date_id: Option<i64>,
    ) -> Self {
        if let Some(slot_id) = public_event_slot_id {
            CapacityScope::PublicSlot(slot_id)
        } else if let Some(timeslot_id) = timeslot_id {
            CapacityScope::Timeslot(timeslot_id)
        } else if let Some(date_id) = public_event_date_id {
            CapacityScope::PublicDate(date_id)
        } else {
            CapacityScope::Event(event_id)
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            CapacityScope::Event(_) => ScopeKind::Event,
            CapacityScope::Timeslot(_) => ScopeKind::Timeslot,
            CapacityScope::PublicSlot(_) => ScopeKind::PublicSlot,
            CapacityScope::PublicDate(_) => ScopeKind::PublicDate,
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            CapacityScope::Event(id)
            | CapacityScope::Timeslot(id)
            | CapacityScope::PublicSlot(id)
            | CapacityScope::PublicDate(id) => id,
        }
    }

    /// Scopes whose counters live in the public schedule database
    pub fn is_public(&self) -> bool {
        matches!(self, CapacityScope::PublicSlot(_) | CapacityScope::PublicDate(_))
    }
}

impl std::fmt::Display for CapacityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityScope::Event(id) => write!(f, "event:{}", id),
            CapacityScope::Timeslot(id) => write!(f, "timeslot:{}", id),
            CapacityScope::PublicSlot(id) => write!(f, "public_slot:{}", id),
            CapacityScope::PublicDate(id) => write!(f, "public_date:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i64,
    pub event_id: i64,
    pub household_id: i64,
    pub timeslot_id: Option<i64>,
    pub public_event_slot_id: Option<i64>,
    pub public_event_date_id: Option<i64>,
    pub scope_kind: ScopeKind,
    pub status: RegistrationStatus,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Rebuild the capacity scope stored on the row
    pub fn scope(&self) -> CapacityScope {
        let scope = match self.scope_kind {
            ScopeKind::Event => None,
            ScopeKind::Timeslot => self.timeslot_id.map(CapacityScope::Timeslot),
            ScopeKind::PublicSlot => self.public_event_slot_id.map(CapacityScope::PublicSlot),
            ScopeKind::PublicDate => self.public_event_date_id.map(CapacityScope::PublicDate),
        };
        // the schema check constraint guarantees the id for non-event kinds
        scope.unwrap_or(CapacityScope::Event(self.event_id))
    }
}

/// How the ledger settles the status of a new registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Status already settled, e.g. by a public counter reservation
    Fixed(RegistrationStatus),
    /// Confirm while the scope's seat-holding rows stay below the capacity.
    /// The ledger counts and inserts while holding the scope lock.
    WithinCapacity(Option<i32>),
}

impl Admission {
    /// Status for a scope that currently has `taken` seat-holding rows
    pub fn status_for(self, taken: i64) -> RegistrationStatus {
        match self {
            Admission::Fixed(status) => status,
            Admission::WithinCapacity(capacity) if has_capacity(capacity, taken) => RegistrationStatus::Confirmed,
            Admission::WithinCapacity(_) => RegistrationStatus::Waitlisted,
        }
    }
}

/// Fields for inserting a registration
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub event_id: i64,
    pub household_id: i64,
    pub scope: CapacityScope,
    pub timeslot_id: Option<i64>,
    pub public_event_slot_id: Option<i64>,
    pub public_event_date_id: Option<i64>,
    pub admission: Admission,
    pub created_by: Option<i64>,
    pub attendee_member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationAttendee {
    pub id: i64,
    pub registration_id: i64,
    pub household_member_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CheckInAudit {
    pub id: i64,
    pub registration_id: i64,
    pub created_by: Option<i64>,
    pub attendee_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub event_id: i64,
    pub timeslot_id: Option<i64>,
    pub public_event_slot_id: Option<i64>,
    pub public_event_date_id: Option<i64>,
    #[serde(default, alias = "attendee_member_ids")]
    pub attendees: Vec<i64>,
}

impl RegisterRequest {
    pub fn for_event(event_id: i64) -> Self {
        Self {
            event_id,
            timeslot_id: None,
            public_event_slot_id: None,
            public_event_date_id: None,
            attendees: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckInRequest {
    pub registration_id: i64,
    #[serde(default)]
    pub attendee_ids: Vec<i64>,
}
