//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod event;
pub mod household;
pub mod public_schedule;
pub mod registration;

// Re-export commonly used models
pub use event::{Event, EventTimeslot, EventAvailability, TimeslotAvailability, ScopeAvailability};
pub use household::{Household, HouseholdMember, CreateHouseholdRequest};
pub use public_schedule::{
    PublicEventDate, PublicEventHour, PublicEventSlot, CapacityCounter, ReconcileReport, SeatReservation,
    has_capacity, decremented,
};
pub use registration::{
    Registration, RegistrationStatus, ScopeKind, CapacityScope, NewRegistration, Admission,
    RegistrationAttendee, CheckInAudit, RegisterRequest, CheckInRequest,
};
