//! Registration endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use crate::middleware::StaffCaller;
use crate::models::{CheckInRequest, RegisterRequest, Registration};
use crate::services::Caller;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_staff_action;

/// POST /registrations
pub async fn register(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>)> {
    let registration = state
        .services
        .registration_service
        .register(&caller, request)
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// PATCH /registrations/:id/cancel
pub async fn cancel(
    State(state): State<AppState>,
    caller: Caller,
    Path(registration_id): Path<i64>,
) -> Result<Json<Registration>> {
    let registration = state
        .services
        .registration_service
        .cancel(&caller, registration_id)
        .await?;

    Ok(Json(registration))
}

/// POST /registrations/check-in
pub async fn check_in(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<CheckInRequest>,
) -> Result<Json<Registration>> {
    let registration = state
        .services
        .registration_service
        .check_in(&caller, request)
        .await?;

    Ok(Json(registration))
}

/// GET /registrations/event/:event_id
pub async fn list_for_event(
    State(state): State<AppState>,
    staff: StaffCaller,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<Registration>>> {
    let registrations = state
        .services
        .registration_service
        .list_for_event(event_id)
        .await?;

    info!(event_id = event_id, count = registrations.len(), "Listed event registrations");
    let details = format!("event_id={}", event_id);
    log_staff_action(staff.user_id, "list_registrations", Some(details.as_str()));
    Ok(Json(registrations))
}
