//! Authentication middleware
//!
//! Resolves the caller of a request from `Authorization: Bearer <jwt>` or,
//! failing that, from an `X-Guest-Token` header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use tracing::debug;
use crate::services::{AuthService, Caller};
use crate::state::AppState;
use crate::utils::errors::{PantryError, Result};

pub const GUEST_TOKEN_HEADER: &str = "x-guest-token";

/// Identify the caller from request headers
pub fn resolve_caller(auth: &AuthService, headers: &HeaderMap) -> Result<Caller> {
    if let Some(value) = headers.get(axum::http::header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| PantryError::Unauthorized("Invalid authorization header".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PantryError::Unauthorized("Expected 'Bearer <token>'".to_string()))?;
        return auth.verify_token(token);
    }

    if let Some(value) = headers.get(GUEST_TOKEN_HEADER) {
        let token = value
            .to_str()
            .map_err(|_| PantryError::Unauthorized("Invalid guest token header".to_string()))?;
        return auth.guest(token);
    }

    debug!("Request without credentials");
    Err(PantryError::Unauthorized("Missing credentials".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = PantryError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // The rate limiter may already have resolved the caller
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }

        resolve_caller(&state.services.auth_service, &parts.headers)
    }
}

/// Staff caller with a verified user id
#[derive(Debug, Clone)]
pub struct StaffCaller {
    pub user_id: i64,
    pub caller: Caller,
}

#[async_trait]
impl FromRequestParts<AppState> for StaffCaller {
    type Rejection = PantryError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let caller = Caller::from_request_parts(parts, state).await?;
        let user_id = state.services.auth_service.require_staff(&caller)?;
        Ok(Self { user_id, caller })
    }
}
