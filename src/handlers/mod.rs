//! HTTP handlers module
//!
//! Route handlers grouped by resource, plus the router that wires them to
//! the shared state and middleware.

pub mod admin;
pub mod events;
pub mod health;
pub mod registrations;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use crate::middleware::rate_limit;
use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    // Mutating routes share the per-caller rate limit
    let mutating = Router::new()
        .route("/registrations", post(registrations::register))
        .route("/registrations/:id/cancel", patch(registrations::cancel))
        .route("/registrations/check-in", post(registrations::check_in))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    Router::new()
        .route("/health", get(health::health))
        .route("/registrations/event/:event_id", get(registrations::list_for_event))
        .route("/events/:event_id/availability", get(events::availability))
        .route(
            "/admin/public-schedule/reconcile",
            post(admin::reconcile_public_counters),
        )
        .merge(mutating)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
