//! Event repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use crate::database::traits::EventCatalog;
use crate::models::event::{Event, EventTimeslot};
use crate::models::registration::CapacityScope;
use crate::utils::errors::PantryError;

#[derive(Debug, Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find event by ID regardless of its active flag
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Event>, PantryError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, starts_at, ends_at, capacity, is_active, created_at, updated_at FROM events WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    /// List active events ordered by start time
    pub async fn list_active(&self, limit: i64, offset: i64) -> Result<Vec<Event>, PantryError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT id, name, starts_at, ends_at, capacity, is_active, created_at, updated_at FROM events WHERE is_active = true ORDER BY starts_at ASC NULLS LAST, id ASC LIMIT $1 OFFSET $2"
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }
}

#[async_trait]
impl EventCatalog for EventRepository {
    async fn find_active_event(&self, event_id: i64) -> Result<Option<Event>, PantryError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, starts_at, ends_at, capacity, is_active, created_at, updated_at FROM events WHERE id = $1 AND is_active = true"
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn find_active_timeslot(&self, timeslot_id: i64, event_id: i64) -> Result<Option<EventTimeslot>, PantryError> {
        let timeslot = sqlx::query_as::<_, EventTimeslot>(
            r#"
            SELECT id, event_id, starts_at, ends_at, capacity, is_active, created_at, updated_at
            FROM event_timeslots
            WHERE id = $1 AND event_id = $2 AND is_active = true
            "#
        )
        .bind(timeslot_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(timeslot)
    }

    async fn list_active_timeslots(&self, event_id: i64) -> Result<Vec<EventTimeslot>, PantryError> {
        let timeslots = sqlx::query_as::<_, EventTimeslot>(
            r#"
            SELECT id, event_id, starts_at, ends_at, capacity, is_active, created_at, updated_at
            FROM event_timeslots
            WHERE event_id = $1 AND is_active = true
            ORDER BY starts_at ASC, id ASC
            "#
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(timeslots)
    }

    async fn scope_capacity(&self, scope: &CapacityScope) -> Result<Option<i32>, PantryError> {
        let query = match scope {
            CapacityScope::Event(_) => "SELECT capacity FROM events WHERE id = $1",
            CapacityScope::Timeslot(_) => "SELECT capacity FROM event_timeslots WHERE id = $1",
            CapacityScope::PublicSlot(_) | CapacityScope::PublicDate(_) => return Ok(None),
        };

        let capacity: Option<(Option<i32>,)> = sqlx::query_as(query)
            .bind(scope.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(capacity.and_then(|row| row.0))
    }
}
