//! Event availability endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use crate::models::EventAvailability;
use crate::services::Caller;
use crate::state::AppState;
use crate::utils::errors::Result;

/// GET /events/:event_id/availability
pub async fn availability(
    State(state): State<AppState>,
    _caller: Caller,
    Path(event_id): Path<i64>,
) -> Result<Json<EventAvailability>> {
    let availability = state
        .services
        .registration_service
        .event_availability(event_id)
        .await?;

    Ok(Json(availability))
}
