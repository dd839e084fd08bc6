//! Public schedule repository implementation
//!
//! Talks to the public schedule database. Every counter change is a single
//! `UPDATE` so concurrent adjustments never lose an increment. Reservations
//! carry the capacity check in their `WHERE` clause and decrements clamp at
//! zero inside the statement.

use async_trait::async_trait;
use sqlx::PgPool;
use crate::database::traits::ScheduleCounterStore;
use crate::models::public_schedule::{PublicEventDate, PublicEventSlot, SeatReservation};
use crate::utils::errors::PantryError;
use crate::utils::logging::log_counter_change;

#[derive(Debug, Clone)]
pub struct PublicScheduleRepository {
    pool: PgPool,
}

impl PublicScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Full slot row. Diagnostic accessor used by operators and integration
    /// tests; services go through `ScheduleCounterStore`.
    pub async fn find_slot(&self, slot_id: i64) -> Result<Option<PublicEventSlot>, PantryError> {
        let slot = sqlx::query_as::<_, PublicEventSlot>(
            "SELECT id, event_hour_id, start_time, end_time, capacity, reserved FROM event_slots WHERE id = $1"
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(slot)
    }

    /// Full date row, for diagnostics and tests
    pub async fn find_date(&self, date_id: i64) -> Result<Option<PublicEventDate>, PantryError> {
        let date = sqlx::query_as::<_, PublicEventDate>(
            "SELECT id, event_id, date, capacity, reserved FROM event_dates WHERE id = $1"
        )
        .bind(date_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(date)
    }

    /// Apply `delta` to a slot and return its owning hour, if the slot exists
    async fn adjust_slot(&self, slot_id: i64, delta: i32) -> Result<Option<Option<i64>>, PantryError> {
        let hour_id: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            UPDATE event_slots
            SET reserved = GREATEST(reserved + $2, 0)
            WHERE id = $1
            RETURNING event_hour_id
            "#
        )
        .bind(slot_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await?;

        log_counter_change("slot", slot_id, delta, hour_id.is_some());
        Ok(hour_id.map(|row| row.0))
    }

    async fn adjust_date(&self, date_id: i64, delta: i32) -> Result<bool, PantryError> {
        let result = sqlx::query(
            "UPDATE event_dates SET reserved = GREATEST(reserved + $2, 0) WHERE id = $1"
        )
        .bind(date_id)
        .bind(delta)
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() > 0;
        log_counter_change("date", date_id, delta, applied);
        Ok(applied)
    }

    async fn row_exists(&self, table: &'static str, id: i64) -> Result<bool, PantryError> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", table);
        let exists: (bool,) = sqlx::query_as(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists.0)
    }

    async fn date_for_hour(&self, hour_id: i64) -> Result<Option<i64>, PantryError> {
        let date_id: Option<(Option<i64>,)> = sqlx::query_as(
            "SELECT event_date_id FROM event_hours WHERE id = $1"
        )
        .bind(hour_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(date_id.and_then(|row| row.0))
    }

    async fn adjust_slot_and_date(&self, slot_id: i64, delta: i32) -> Result<(), PantryError> {
        let Some(hour_id) = self.adjust_slot(slot_id, delta).await? else {
            return Ok(());
        };
        let Some(hour_id) = hour_id else {
            return Ok(());
        };
        if let Some(date_id) = self.date_for_hour(hour_id).await? {
            self.adjust_date(date_id, delta).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl ScheduleCounterStore for PublicScheduleRepository {
    async fn reserve_slot(&self, slot_id: i64) -> Result<SeatReservation, PantryError> {
        let hour_id: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            UPDATE event_slots
            SET reserved = reserved + 1
            WHERE id = $1 AND (capacity IS NULL OR reserved < capacity)
            RETURNING event_hour_id
            "#
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((hour_id,)) = hour_id else {
            return if self.row_exists("event_slots", slot_id).await? {
                Ok(SeatReservation::Full)
            } else {
                Ok(SeatReservation::Untracked)
            };
        };
        log_counter_change("slot", slot_id, 1, true);

        // The date mirrors its slots and is not a gate for slot registrations
        if let Some(hour_id) = hour_id {
            if let Some(date_id) = self.date_for_hour(hour_id).await? {
                self.adjust_date(date_id, 1).await?;
            }
        }

        Ok(SeatReservation::Reserved)
    }

    async fn decrement_slot_and_date(&self, slot_id: i64) -> Result<(), PantryError> {
        self.adjust_slot_and_date(slot_id, -1).await
    }

    async fn reserve_date(&self, date_id: i64) -> Result<SeatReservation, PantryError> {
        let result = sqlx::query(
            "UPDATE event_dates SET reserved = reserved + 1 WHERE id = $1 AND (capacity IS NULL OR reserved < capacity)"
        )
        .bind(date_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            log_counter_change("date", date_id, 1, true);
            return Ok(SeatReservation::Reserved);
        }

        if self.row_exists("event_dates", date_id).await? {
            Ok(SeatReservation::Full)
        } else {
            Ok(SeatReservation::Untracked)
        }
    }

    async fn decrement_date(&self, date_id: i64) -> Result<(), PantryError> {
        self.adjust_date(date_id, -1).await?;
        Ok(())
    }

    async fn date_for_slot(&self, slot_id: i64) -> Result<Option<i64>, PantryError> {
        let date_id: Option<(Option<i64>,)> = sqlx::query_as(
            r#"
            SELECT h.event_date_id
            FROM event_slots s
            INNER JOIN event_hours h ON h.id = s.event_hour_id
            WHERE s.id = $1
            "#
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(date_id.and_then(|row| row.0))
    }

    async fn set_slot_reserved(&self, slot_id: i64, reserved: i32) -> Result<bool, PantryError> {
        let result = sqlx::query("UPDATE event_slots SET reserved = $2 WHERE id = $1")
            .bind(slot_id)
            .bind(reserved.max(0))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_date_reserved(&self, date_id: i64, reserved: i32) -> Result<bool, PantryError> {
        let result = sqlx::query("UPDATE event_dates SET reserved = $2 WHERE id = $1")
            .bind(date_id)
            .bind(reserved.max(0))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
