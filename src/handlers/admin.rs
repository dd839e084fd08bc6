//! Staff maintenance endpoints

use axum::{extract::State, Json};
use crate::middleware::StaffCaller;
use crate::models::ReconcileReport;
use crate::state::AppState;
use crate::utils::errors::Result;
use crate::utils::logging::log_staff_action;

/// POST /admin/public-schedule/reconcile
pub async fn reconcile_public_counters(
    State(state): State<AppState>,
    staff: StaffCaller,
) -> Result<Json<ReconcileReport>> {
    log_staff_action(staff.user_id, "reconcile_public_counters", None);
    let report = state.services.reconciler.reconcile().await?;
    Ok(Json(report))
}
