//! Registration repository implementation
//!
//! Rows are addressed through their tagged capacity scope; each scope kind
//! maps onto the column holding its id.
//!
//! Capacity decisions take a transaction-scoped advisory lock keyed by the
//! scope before counting, so every server sharing the database serializes
//! on the same key and the lock is released at commit or rollback.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgExecutor, PgPool};
use crate::database::traits::RegistrationLedger;
use crate::models::has_capacity;
use crate::models::registration::{
    Admission, CapacityScope, CheckInAudit, NewRegistration, Registration, RegistrationAttendee,
    RegistrationStatus, ScopeKind,
};
use crate::utils::errors::PantryError;

const REGISTRATION_COLUMNS: &str = "id, event_id, household_id, timeslot_id, public_event_slot_id, public_event_date_id, scope_kind, status, created_by, created_at, updated_at";

/// Column holding the id for a scope kind
fn scope_column(kind: ScopeKind) -> &'static str {
    match kind {
        ScopeKind::Event => "event_id",
        ScopeKind::Timeslot => "timeslot_id",
        ScopeKind::PublicSlot => "public_event_slot_id",
        ScopeKind::PublicDate => "public_event_date_id",
    }
}

const SEAT_STATUSES: &str = "'confirmed', 'checked_in'";

/// `status_filter` is a fixed SQL list of status literals
async fn count_in_scope<'e, E: PgExecutor<'e>>(
    executor: E,
    scope: &CapacityScope,
    status_filter: &'static str,
) -> Result<i64, PantryError> {
    let query = format!(
        "SELECT COUNT(*) FROM registrations WHERE scope_kind = $1 AND {} = $2 AND status IN ({})",
        scope_column(scope.kind()),
        status_filter
    );

    let count: (i64,) = sqlx::query_as(&query)
        .bind(scope.kind())
        .bind(scope.id())
        .fetch_one(executor)
        .await?;

    Ok(count.0)
}

/// Block until this transaction owns the scope's advisory lock
async fn lock_scope(conn: &mut PgConnection, scope: &CapacityScope) -> Result<(), PantryError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind(scope.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

#[derive(Debug, Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attendee rows of a registration.
    ///
    /// Diagnostic accessor for operators and integration tests; the request
    /// path never reads attendees back.
    pub async fn get_attendees(&self, registration_id: i64) -> Result<Vec<RegistrationAttendee>, PantryError> {
        let attendees = sqlx::query_as::<_, RegistrationAttendee>(
            "SELECT id, registration_id, household_member_id, created_at FROM registration_attendees WHERE registration_id = $1 ORDER BY id ASC"
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attendees)
    }

    /// Check-in audit rows of a registration, for diagnostics and tests
    pub async fn get_check_ins(&self, registration_id: i64) -> Result<Vec<CheckInAudit>, PantryError> {
        let audits = sqlx::query_as::<_, CheckInAudit>(
            "SELECT id, registration_id, created_by, attendee_count, created_at FROM checkin_audits WHERE registration_id = $1 ORDER BY id ASC"
        )
        .bind(registration_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(audits)
    }
}

#[async_trait]
impl RegistrationLedger for RegistrationRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Registration>, PantryError> {
        let query = format!("SELECT {} FROM registrations WHERE id = $1", REGISTRATION_COLUMNS);

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn find_active_for_event_and_household(&self, event_id: i64, household_id: i64) -> Result<Option<Registration>, PantryError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 AND household_id = $2 AND status IN ('confirmed', 'waitlisted', 'checked_in') LIMIT 1",
            REGISTRATION_COLUMNS
        );

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(household_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn count_confirmed(&self, scope: &CapacityScope) -> Result<i64, PantryError> {
        count_in_scope(&self.pool, scope, SEAT_STATUSES).await
    }

    async fn count_waitlisted(&self, scope: &CapacityScope) -> Result<i64, PantryError> {
        count_in_scope(&self.pool, scope, "'waitlisted'").await
    }

    async fn create(&self, registration: NewRegistration) -> Result<Registration, PantryError> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO registrations (event_id, household_id, timeslot_id, public_event_slot_id, public_event_date_id, scope_kind, status, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let status = match registration.admission {
            Admission::Fixed(status) => status,
            Admission::WithinCapacity(_) => {
                lock_scope(&mut tx, &registration.scope).await?;
                let taken = count_in_scope(&mut *tx, &registration.scope, SEAT_STATUSES).await?;
                registration.admission.status_for(taken)
            }
        };

        let created = sqlx::query_as::<_, Registration>(&query)
            .bind(registration.event_id)
            .bind(registration.household_id)
            .bind(registration.timeslot_id)
            .bind(registration.public_event_slot_id)
            .bind(registration.public_event_date_id)
            .bind(registration.scope.kind())
            .bind(status)
            .bind(registration.created_by)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        for member_id in &registration.attendee_member_ids {
            sqlx::query(
                "INSERT INTO registration_attendees (registration_id, household_member_id, created_at) VALUES ($1, $2, $3)"
            )
            .bind(created.id)
            .bind(member_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn update_status(&self, id: i64, expected: RegistrationStatus, status: RegistrationStatus) -> Result<Option<Registration>, PantryError> {
        let query = format!(
            r#"
            UPDATE registrations
            SET status = $3,
                updated_at = $4
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(id)
            .bind(expected)
            .bind(status)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn next_waitlisted(&self, event_id: i64, scope: &CapacityScope) -> Result<Option<Registration>, PantryError> {
        let query = format!(
            r#"
            SELECT {}
            FROM registrations
            WHERE event_id = $1 AND scope_kind = $2 AND {} = $3 AND status = 'waitlisted'
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
            REGISTRATION_COLUMNS,
            scope_column(scope.kind())
        );

        let registration = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(scope.kind())
            .bind(scope.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(registration)
    }

    async fn promote_next(&self, event_id: i64, scope: &CapacityScope, capacity: Option<i32>) -> Result<Option<Registration>, PantryError> {
        let query = format!(
            r#"
            UPDATE registrations
            SET status = 'confirmed',
                updated_at = $4
            WHERE id = (
                SELECT id
                FROM registrations
                WHERE event_id = $1 AND scope_kind = $2 AND {} = $3 AND status = 'waitlisted'
                ORDER BY created_at ASC, id ASC
                LIMIT 1
            )
            AND status = 'waitlisted'
            RETURNING {}
            "#,
            scope_column(scope.kind()),
            REGISTRATION_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        lock_scope(&mut tx, scope).await?;

        let taken = count_in_scope(&mut *tx, scope, SEAT_STATUSES).await?;
        if !has_capacity(capacity, taken) {
            return Ok(None);
        }

        let promoted = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .bind(scope.kind())
            .bind(scope.id())
            .bind(Utc::now())
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(promoted)
    }

    async fn list_for_event(&self, event_id: i64) -> Result<Vec<Registration>, PantryError> {
        let query = format!(
            "SELECT {} FROM registrations WHERE event_id = $1 ORDER BY created_at ASC, id ASC",
            REGISTRATION_COLUMNS
        );

        let registrations = sqlx::query_as::<_, Registration>(&query)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(registrations)
    }

    async fn check_in(&self, registration_id: i64, created_by: Option<i64>, attendee_count: i32) -> Result<Option<(Registration, CheckInAudit)>, PantryError> {
        let now = Utc::now();
        let query = format!(
            r#"
            UPDATE registrations
            SET status = 'checked_in',
                updated_at = $2
            WHERE id = $1 AND status = 'confirmed'
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );

        let mut tx = self.pool.begin().await?;

        let Some(registration) = sqlx::query_as::<_, Registration>(&query)
            .bind(registration_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let audit = sqlx::query_as::<_, CheckInAudit>(
            r#"
            INSERT INTO checkin_audits (registration_id, created_by, attendee_count, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, registration_id, created_by, attendee_count, created_at
            "#
        )
        .bind(registration_id)
        .bind(created_by)
        .bind(attendee_count)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((registration, audit)))
    }

    async fn public_slot_seat_counts(&self) -> Result<Vec<(i64, i64)>, PantryError> {
        let counts: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT public_event_slot_id, COUNT(*) FILTER (WHERE status IN ('confirmed', 'checked_in'))
            FROM registrations
            WHERE scope_kind = 'public_slot'
            GROUP BY public_event_slot_id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    async fn public_date_seat_counts(&self) -> Result<Vec<(i64, i64)>, PantryError> {
        let counts: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT public_event_date_id, COUNT(*) FILTER (WHERE status IN ('confirmed', 'checked_in'))
            FROM registrations
            WHERE scope_kind = 'public_date'
            GROUP BY public_event_date_id
            "#
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }
}
