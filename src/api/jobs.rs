//! Manual triggers for the periodic sweep jobs
//!
//! The same sweeps run on a timer inside the server; these endpoints let
//! operators force a run and inspect the outcome counts.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, models::transaction::OverdueSweepOutcome};

/// Outcome of one SLA sweep run
#[derive(Serialize, ToSchema)]
pub struct SlaSweepOutcome {
    pub newly_breached: u32,
}

/// Run the overdue sweep now
#[utoipa::path(
    post,
    path = "/jobs/overdue-sweep",
    tag = "jobs",
    responses(
        (status = 200, description = "Sweep outcome", body = OverdueSweepOutcome)
    )
)]
pub async fn overdue_sweep(
    State(state): State<crate::AppState>,
) -> AppResult<Json<OverdueSweepOutcome>> {
    let outcome = state.services.transactions.update_overdue_status().await?;
    Ok(Json(outcome))
}

/// Run the SLA breach sweep now
#[utoipa::path(
    post,
    path = "/jobs/sla-sweep",
    tag = "jobs",
    responses(
        (status = 200, description = "Sweep outcome", body = SlaSweepOutcome)
    )
)]
pub async fn sla_sweep(
    State(state): State<crate::AppState>,
) -> AppResult<Json<SlaSweepOutcome>> {
    let newly_breached = state.services.sla.check_sla_breaches().await?;
    Ok(Json(SlaSweepOutcome { newly_breached }))
}
