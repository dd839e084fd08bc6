//! Household repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use crate::database::traits::HouseholdDirectory;
use crate::models::household::{Household, HouseholdMember, CreateHouseholdRequest};
use crate::utils::errors::PantryError;

#[derive(Debug, Clone)]
pub struct HouseholdRepository {
    pool: PgPool,
}

impl HouseholdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get household members, head of household first
    pub async fn get_members(&self, household_id: i64) -> Result<Vec<HouseholdMember>, PantryError> {
        let members = sqlx::query_as::<_, HouseholdMember>(
            "SELECT id, household_id, name, is_head, created_at FROM household_members WHERE household_id = $1 ORDER BY is_head DESC, id ASC"
        )
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }
}

#[async_trait]
impl HouseholdDirectory for HouseholdRepository {
    async fn find_by_owner(&self, user_id: i64) -> Result<Option<Household>, PantryError> {
        let household = sqlx::query_as::<_, Household>(
            "SELECT id, name, owner_user_id, guest_token, created_at, updated_at FROM households WHERE owner_user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(household)
    }

    async fn find_by_guest_token(&self, token: &str) -> Result<Option<Household>, PantryError> {
        let household = sqlx::query_as::<_, Household>(
            "SELECT id, name, owner_user_id, guest_token, created_at, updated_at FROM households WHERE guest_token = $1"
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(household)
    }

    /// Create the household together with its head member
    async fn create_minimal(&self, request: CreateHouseholdRequest) -> Result<Household, PantryError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let household = sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (name, owner_user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, owner_user_id, guest_token, created_at, updated_at
            "#
        )
        .bind(&request.name)
        .bind(request.owner_user_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO household_members (household_id, name, is_head, created_at) VALUES ($1, $2, true, $3)"
        )
        .bind(household.id)
        .bind(&request.head_member_name)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(household)
    }

    async fn member_ids(&self, household_id: i64) -> Result<Vec<i64>, PantryError> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            "SELECT id FROM household_members WHERE household_id = $1 ORDER BY id ASC"
        )
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|row| row.0).collect())
    }
}
