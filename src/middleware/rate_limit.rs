//! Rate limiting middleware
//!
//! Per-caller token bucket on the mutating registration routes. Callers are
//! keyed by user id or guest token; requests without usable credentials pass
//! through and are rejected by the handler's extractor.

use std::num::NonZeroU32;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};
use crate::config::RateLimitConfig;
use crate::middleware::auth::resolve_caller;
use crate::state::AppState;
use crate::utils::errors::{PantryError, Result};

/// Keyed limiter shared by all request tasks
#[derive(Debug)]
pub struct CallerRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl CallerRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.requests_per_minute)
            .ok_or_else(|| PantryError::Config("requests_per_minute must be positive".to_string()))?;
        let burst = NonZeroU32::new(config.burst)
            .ok_or_else(|| PantryError::Config("burst must be positive".to_string()))?;

        Ok(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute).allow_burst(burst)),
        })
    }

    /// Take one request from the caller's bucket
    pub fn check(&self, key: &str) -> Result<()> {
        match self.limiter.check_key(&key.to_string()) {
            Ok(()) => Ok(()),
            Err(_) => {
                warn!(caller = key, "Rate limit exceeded");
                Err(PantryError::RateLimitExceeded)
            }
        }
    }

    /// Drop buckets that have refilled completely
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }
}

/// axum middleware enforcing the per-caller limit
pub async fn rate_limit(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let Some(limiter) = state.rate_limiter.as_ref() else {
        return next.run(request).await;
    };

    match resolve_caller(&state.services.auth_service, request.headers()) {
        Ok(caller) => {
            if let Err(e) = limiter.check(&caller.rate_limit_key()) {
                return e.into_response();
            }
            request.extensions_mut().insert(caller);
        }
        Err(e) => debug!(error = %e, "Skipping rate limit for unauthenticated request"),
    }

    next.run(request).await
}
