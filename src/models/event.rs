//! Event and timeslot models

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// `None` means unlimited
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventTimeslot {
    pub id: i64,
    pub event_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Independent of the parent event's capacity
    pub capacity: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Seat usage for a single internal capacity scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAvailability {
    pub capacity: Option<i32>,
    pub confirmed: i64,
    pub waitlisted: i64,
    /// `None` when the scope is unlimited
    pub remaining: Option<i64>,
}

impl ScopeAvailability {
    pub fn new(capacity: Option<i32>, confirmed: i64, waitlisted: i64) -> Self {
        let remaining = capacity.map(|c| (i64::from(c) - confirmed).max(0));
        Self {
            capacity,
            confirmed,
            waitlisted,
            remaining,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeslotAvailability {
    pub timeslot_id: i64,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(flatten)]
    pub availability: ScopeAvailability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventAvailability {
    pub event_id: i64,
    pub name: String,
    #[serde(flatten)]
    pub availability: ScopeAvailability,
    pub timeslots: Vec<TimeslotAvailability>,
}
