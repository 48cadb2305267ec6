//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{health, items, jobs, maintenance, transactions};
use crate::error::ErrorResponse;
use crate::models::{
    enums::{
        ItemStatus, MaintenancePriority, MaintenanceStatus, MaintenanceType, ReturnCondition,
        TransactionStatus,
    },
    item::Item,
    maintenance::{
        MaintenanceRequest, MaintenanceStatistics, SlaHealth, SlaStatistics, SlaTimeRemaining,
    },
    transaction::{LateFeePreview, OverdueSweepOutcome, Transaction},
    user::User,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventra API",
        version = "0.1.0",
        description = "Institutional Inventory & Lending Management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Inventra Team", email = "contact@inventra.dev")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Items
        items::list_items,
        items::get_item,
        // Transactions
        transactions::checkout,
        transactions::list_transactions,
        transactions::overdue_transactions,
        transactions::get_transaction,
        transactions::late_fee_preview,
        transactions::return_item,
        transactions::cancel_transaction,
        transactions::extend_due_date,
        transactions::pay_late_fee,
        transactions::user_transactions,
        // Maintenance / SLA
        maintenance::create_request,
        maintenance::list_requests,
        maintenance::get_request,
        maintenance::assign_request,
        maintenance::complete_request,
        maintenance::cancel_request,
        maintenance::time_remaining,
        maintenance::maintenance_statistics,
        maintenance::sla_statistics,
        // Jobs
        jobs::overdue_sweep,
        jobs::sla_sweep,
    ),
    components(
        schemas(
            ErrorResponse,
            health::HealthResponse,
            Item,
            User,
            Transaction,
            LateFeePreview,
            OverdueSweepOutcome,
            MaintenanceRequest,
            MaintenanceStatistics,
            SlaStatistics,
            SlaTimeRemaining,
            SlaHealth,
            ItemStatus,
            TransactionStatus,
            ReturnCondition,
            MaintenancePriority,
            MaintenanceStatus,
            MaintenanceType,
            transactions::CheckoutRequest,
            transactions::ReturnRequest,
            transactions::ExtendRequest,
            maintenance::CreateMaintenanceRequest,
            maintenance::AssignRequest,
            maintenance::CompleteRequest,
            maintenance::TimeRemainingResponse,
            jobs::SlaSweepOutcome,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "items", description = "Item lookups"),
        (name = "transactions", description = "Loan lifecycle"),
        (name = "maintenance", description = "Maintenance requests and SLA tracking"),
        (name = "jobs", description = "Periodic sweep triggers")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI router
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
