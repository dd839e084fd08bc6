//! Authentication service implementation
//!
//! Verifies bearer tokens issued by the identity service and opaque guest
//! tokens, and answers role checks for staff-only operations. Token issuance
//! lives elsewhere.

use std::collections::HashSet;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::config::AuthConfig;
use crate::utils::errors::{PantryError, Result};

/// Longest accepted guest token
const MAX_GUEST_TOKEN_LEN: usize = 128;

/// Claims carried by access tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: usize,
}

/// The party behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    User {
        user_id: i64,
        role: Option<String>,
        name: Option<String>,
        email: Option<String>,
    },
    Guest {
        token: String,
    },
}

impl Caller {
    /// User id for signed-in callers
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Caller::User { user_id, .. } => Some(*user_id),
            Caller::Guest { .. } => None,
        }
    }

    /// Display name usable for a freshly provisioned household
    pub fn profile_name(&self) -> Option<String> {
        match self {
            Caller::User { name, email, .. } => name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    email
                        .as_deref()
                        .and_then(|e| e.split('@').next())
                        .filter(|local| !local.is_empty())
                        .map(str::to_string)
                }),
            Caller::Guest { .. } => None,
        }
    }

    /// Key used for per-caller rate limiting
    pub fn rate_limit_key(&self) -> String {
        match self {
            Caller::User { user_id, .. } => format!("user:{}", user_id),
            Caller::Guest { token } => format!("guest:{}", token),
        }
    }
}

/// Authentication service for token verification and role checks
#[derive(Clone)]
pub struct AuthService {
    decoding_key: DecodingKey,
    validation: Validation,
    guest_tokens_enabled: bool,
    staff_roles: HashSet<String>,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            guest_tokens_enabled: config.guest_tokens_enabled,
            staff_roles: config.staff_roles.iter().cloned().collect(),
        }
    }

    /// Verify a bearer token and build the caller from its claims
    pub fn verify_token(&self, token: &str) -> Result<Caller> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let user_id = claims.sub.parse::<i64>().map_err(|_| {
            warn!(sub = %claims.sub, "Token subject is not a user id");
            PantryError::Unauthorized("Invalid token subject".to_string())
        })?;

        debug!(user_id = user_id, role = ?claims.role, "Bearer token verified");
        Ok(Caller::User {
            user_id,
            role: claims.role,
            name: claims.name,
            email: claims.email,
        })
    }

    /// Accept an opaque guest token
    pub fn guest(&self, token: &str) -> Result<Caller> {
        if !self.guest_tokens_enabled {
            return Err(PantryError::Unauthorized("Guest access is disabled".to_string()));
        }

        let token = token.trim();
        let well_formed = !token.is_empty()
            && token.len() <= MAX_GUEST_TOKEN_LEN
            && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(PantryError::Unauthorized("Malformed guest token".to_string()));
        }

        Ok(Caller::Guest { token: token.to_string() })
    }

    /// Check if caller holds a staff role
    pub fn is_staff(&self, caller: &Caller) -> bool {
        match caller {
            Caller::User { role: Some(role), .. } => self.staff_roles.contains(role),
            _ => false,
        }
    }

    /// Staff user id, or Forbidden
    pub fn require_staff(&self, caller: &Caller) -> Result<i64> {
        match caller.user_id() {
            Some(user_id) if self.is_staff(caller) => Ok(user_id),
            _ => {
                warn!(caller = %caller.rate_limit_key(), "Staff-only operation attempted");
                Err(PantryError::forbidden("Staff privileges required"))
            }
        }
    }
}
