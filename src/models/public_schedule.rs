//! Public schedule models
//!
//! Rows of the Date -> Hour -> Slot hierarchy kept in the public schedule
//! database. Each level carries its own capacity and reserved counter.

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveTime};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicEventDate {
    pub id: i64,
    pub event_id: i64,
    pub date: NaiveDate,
    pub capacity: Option<i32>,
    pub reserved: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicEventHour {
    pub id: i64,
    pub event_date_id: Option<i64>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: Option<i32>,
    pub reserved: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicEventSlot {
    pub id: i64,
    pub event_hour_id: Option<i64>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: Option<i32>,
    pub reserved: i32,
}

/// Capacity and current reservations of one counter-bearing row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CapacityCounter {
    pub capacity: Option<i32>,
    pub reserved: i32,
}

impl CapacityCounter {
    pub fn is_full(&self) -> bool {
        !has_capacity(self.capacity, i64::from(self.reserved))
    }
}

/// Outcome of a conditional seat reservation on a public counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatReservation {
    /// Counter incremented
    Reserved,
    /// Counter already at capacity, left untouched
    Full,
    /// No such row; the scope is treated as unlimited
    Untracked,
}

impl SeatReservation {
    /// Whether the registration behind this reservation gets a seat
    pub fn admits(self) -> bool {
        !matches!(self, SeatReservation::Full)
    }
}

/// Seat check shared by every scope: unlimited, or fewer taken than allowed
pub fn has_capacity(capacity: Option<i32>, taken: i64) -> bool {
    match capacity {
        None => true,
        Some(capacity) => taken < i64::from(capacity),
    }
}

/// Counter value after a decrement, never below zero
pub fn decremented(reserved: i32) -> i32 {
    (reserved - 1).max(0)
}

/// Result of recounting public counters from the registration ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub slots_updated: usize,
    pub dates_updated: usize,
    pub slots_missing: usize,
}
