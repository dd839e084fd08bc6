//! Household model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Household {
    pub id: i64,
    pub name: String,
    pub owner_user_id: Option<i64>,
    #[serde(skip_serializing)]
    pub guest_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HouseholdMember {
    pub id: i64,
    pub household_id: i64,
    pub name: String,
    pub is_head: bool,
    pub created_at: DateTime<Utc>,
}

/// Minimal household created for a signed-in caller that has none yet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: String,
    pub owner_user_id: i64,
    pub head_member_name: String,
}
