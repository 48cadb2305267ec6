//! Maintenance request and SLA endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{MaintenancePriority, MaintenanceStatus, MaintenanceType},
        maintenance::{
            MaintenanceRequest, MaintenanceStatistics, NewMaintenanceRequest, SlaStatistics,
            SlaTimeRemaining,
        },
    },
};

/// Create maintenance request payload
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateMaintenanceRequest {
    pub item_id: i32,
    pub requested_by: Option<i32>,
    /// Loan whose return triggered this request, if any
    pub transaction_id: Option<i32>,
    pub maintenance_type: Option<MaintenanceType>,
    /// Priority tier (low/medium/high/urgent); defaults to medium
    pub priority: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
}

/// Assign payload
#[derive(Deserialize, ToSchema)]
pub struct AssignRequest {
    /// Technician taking the request
    pub assigned_to: i32,
}

/// Completion payload
#[derive(Deserialize, Validate, ToSchema)]
pub struct CompleteRequest {
    #[validate(length(max = 2000))]
    pub resolution_notes: Option<String>,
    /// Cost of the work, in currency units
    pub cost: Option<f64>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListMaintenanceQuery {
    pub status: Option<MaintenanceStatus>,
    pub priority: Option<MaintenancePriority>,
    pub item_id: Option<i32>,
}

/// SLA time-remaining response
#[derive(Serialize, ToSchema)]
pub struct TimeRemainingResponse {
    pub request_id: i32,
    /// None when the request carries no SLA
    pub time_remaining: Option<SlaTimeRemaining>,
}

/// Create a maintenance request
#[utoipa::path(
    post,
    path = "/maintenance",
    tag = "maintenance",
    request_body = CreateMaintenanceRequest,
    responses(
        (status = 201, description = "Request created with SLA targets", body = MaintenanceRequest),
        (status = 400, description = "Invalid priority or description"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateMaintenanceRequest>,
) -> AppResult<(StatusCode, Json<MaintenanceRequest>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let priority = match request.priority.as_deref() {
        None => MaintenancePriority::Medium,
        Some(value) => value.parse().map_err(|_| {
            AppError::Validation(format!(
                "Invalid priority. Must be one of: {}",
                MaintenancePriority::ALL.join(", ")
            ))
        })?,
    };

    let created = state
        .services
        .sla
        .create_request(NewMaintenanceRequest {
            item_id: request.item_id,
            requested_by: request.requested_by,
            transaction_id: request.transaction_id,
            maintenance_type: request.maintenance_type,
            priority,
            description: request.description,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// List maintenance requests
#[utoipa::path(
    get,
    path = "/maintenance",
    tag = "maintenance",
    params(ListMaintenanceQuery),
    responses(
        (status = 200, description = "Maintenance requests", body = Vec<MaintenanceRequest>)
    )
)]
pub async fn list_requests(
    State(state): State<crate::AppState>,
    Query(query): Query<ListMaintenanceQuery>,
) -> AppResult<Json<Vec<MaintenanceRequest>>> {
    let requests = state
        .services
        .sla
        .list(query.status, query.priority, query.item_id)
        .await?;
    Ok(Json(requests))
}

/// Get a single maintenance request
#[utoipa::path(
    get,
    path = "/maintenance/{id}",
    tag = "maintenance",
    params(
        ("id" = i32, Path, description = "Maintenance request ID")
    ),
    responses(
        (status = 200, description = "Maintenance request", body = MaintenanceRequest),
        (status = 404, description = "Request not found")
    )
)]
pub async fn get_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MaintenanceRequest>> {
    let request = state.services.sla.get(id).await?;
    Ok(Json(request))
}

/// Assign a request to a technician
#[utoipa::path(
    post,
    path = "/maintenance/{id}/assign",
    tag = "maintenance",
    params(
        ("id" = i32, Path, description = "Maintenance request ID")
    ),
    request_body = AssignRequest,
    responses(
        (status = 200, description = "Request assigned", body = MaintenanceRequest),
        (status = 404, description = "Request or technician not found"),
        (status = 409, description = "Request is closed")
    )
)]
pub async fn assign_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AssignRequest>,
) -> AppResult<Json<MaintenanceRequest>> {
    let updated = state.services.sla.assign(id, request.assigned_to).await?;
    Ok(Json(updated))
}

/// Complete an in-progress request
#[utoipa::path(
    post,
    path = "/maintenance/{id}/complete",
    tag = "maintenance",
    params(
        ("id" = i32, Path, description = "Maintenance request ID")
    ),
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Request completed", body = MaintenanceRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not in progress")
    )
)]
pub async fn complete_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<CompleteRequest>,
) -> AppResult<Json<MaintenanceRequest>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let cost = match request.cost {
        Some(value) => Some(
            Decimal::try_from(value)
                .map_err(|_| AppError::Validation("Invalid cost value".to_string()))?,
        ),
        None => None,
    };

    let updated = state
        .services
        .sla
        .complete(id, request.resolution_notes, cost)
        .await?;
    Ok(Json(updated))
}

/// Cancel an open request
#[utoipa::path(
    post,
    path = "/maintenance/{id}/cancel",
    tag = "maintenance",
    params(
        ("id" = i32, Path, description = "Maintenance request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = MaintenanceRequest),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is closed")
    )
)]
pub async fn cancel_request(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<MaintenanceRequest>> {
    let updated = state.services.sla.cancel(id).await?;
    Ok(Json(updated))
}

/// Time remaining until the first-response deadline
#[utoipa::path(
    get,
    path = "/maintenance/{id}/sla",
    tag = "maintenance",
    params(
        ("id" = i32, Path, description = "Maintenance request ID")
    ),
    responses(
        (status = 200, description = "SLA time remaining", body = TimeRemainingResponse),
        (status = 404, description = "Request not found")
    )
)]
pub async fn time_remaining(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<TimeRemainingResponse>> {
    let time_remaining = state.services.sla.time_remaining(id).await?;
    Ok(Json(TimeRemainingResponse {
        request_id: id,
        time_remaining,
    }))
}

/// Workload overview across all maintenance requests
#[utoipa::path(
    get,
    path = "/maintenance/statistics",
    tag = "maintenance",
    responses(
        (status = 200, description = "Maintenance workload overview", body = MaintenanceStatistics)
    )
)]
pub async fn maintenance_statistics(
    State(state): State<crate::AppState>,
) -> AppResult<Json<MaintenanceStatistics>> {
    let overview = state.services.sla.overview().await?;
    Ok(Json(overview))
}

/// Aggregate SLA compliance metrics
#[utoipa::path(
    get,
    path = "/maintenance/sla/statistics",
    tag = "maintenance",
    responses(
        (status = 200, description = "SLA statistics", body = SlaStatistics)
    )
)]
pub async fn sla_statistics(
    State(state): State<crate::AppState>,
) -> AppResult<Json<SlaStatistics>> {
    let statistics = state.services.sla.statistics().await?;
    Ok(Json(statistics))
}
