//! Loan lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::TransactionStatus,
        transaction::{CheckoutData, LateFeePreview, Transaction, TransactionFilter},
    },
};

/// Checkout request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CheckoutRequest {
    /// Item to check out
    pub item_id: i32,
    /// Borrowing user
    pub user_id: i32,
    /// When the item should be returned (must be in the future)
    pub due_date: DateTime<Utc>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Staff member performing the checkout
    pub checked_out_by: Option<i32>,
}

/// Return request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ReturnRequest {
    /// Condition of the returned item (excellent/good/fair/poor/damaged)
    pub condition: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
    /// Staff member receiving the return
    pub returned_to: Option<i32>,
}

/// Due date extension request
#[derive(Deserialize, ToSchema)]
pub struct ExtendRequest {
    /// New due date; must be in the future and after the current due date
    pub new_due_date: DateTime<Utc>,
}

#[derive(Deserialize, IntoParams)]
pub struct ListTransactionsQuery {
    pub status: Option<TransactionStatus>,
    pub user_id: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Deserialize, IntoParams)]
pub struct UserTransactionsQuery {
    pub status: Option<TransactionStatus>,
}

/// Check out an item to a user
#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Transaction created", body = Transaction),
        (status = 404, description = "Item or user not found"),
        (status = 409, description = "Item not available or due date invalid"),
        (status = 422, description = "Borrower has overdue items or unpaid fees")
    )
)]
pub async fn checkout(
    State(state): State<crate::AppState>,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<Transaction>)> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let transaction = state
        .services
        .transactions
        .checkout(CheckoutData {
            item_id: request.item_id,
            user_id: request.user_id,
            due_date: request.due_date,
            notes: request.notes,
            checked_out_by: request.checked_out_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// List transactions
#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(ListTransactionsQuery),
    responses(
        (status = 200, description = "Transactions", body = Vec<Transaction>)
    )
)]
pub async fn list_transactions(
    State(state): State<crate::AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    let filter = TransactionFilter {
        status: query.status,
        user_id: query.user_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    let transactions = state.services.transactions.list(&filter).await?;
    Ok(Json(transactions))
}

/// Loans currently out past their due date
#[utoipa::path(
    get,
    path = "/transactions/overdue",
    tag = "transactions",
    responses(
        (status = 200, description = "Overdue transactions", body = Vec<Transaction>)
    )
)]
pub async fn overdue_transactions(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = state.services.transactions.overdue_list().await?;
    Ok(Json(transactions))
}

/// Get a single transaction
#[utoipa::path(
    get,
    path = "/transactions/{id}",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction", body = Transaction),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.transactions.get(id).await?;
    Ok(Json(transaction))
}

/// Live late-fee preview
#[utoipa::path(
    get,
    path = "/transactions/{id}/late-fee",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Late fee preview", body = LateFeePreview),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn late_fee_preview(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<LateFeePreview>> {
    let preview = state.services.transactions.late_fee_preview(id).await?;
    Ok(Json(preview))
}

/// Return a borrowed item
#[utoipa::path(
    post,
    path = "/transactions/{id}/return",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    request_body = ReturnRequest,
    responses(
        (status = 200, description = "Item returned", body = Transaction),
        (status = 400, description = "Invalid condition"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction is not open")
    )
)]
pub async fn return_item(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ReturnRequest>,
) -> AppResult<Json<Transaction>> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let transaction = state
        .services
        .transactions
        .return_item(id, &request.condition, request.notes, request.returned_to)
        .await?;
    Ok(Json(transaction))
}

/// Cancel an active transaction
#[utoipa::path(
    post,
    path = "/transactions/{id}/cancel",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Transaction cancelled", body = Transaction),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction is not active")
    )
)]
pub async fn cancel_transaction(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.transactions.cancel(id).await?;
    Ok(Json(transaction))
}

/// Extend the due date of an open loan
#[utoipa::path(
    post,
    path = "/transactions/{id}/extend",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    request_body = ExtendRequest,
    responses(
        (status = 200, description = "Due date extended", body = Transaction),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Transaction closed or date not advancing")
    )
)]
pub async fn extend_due_date(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<ExtendRequest>,
) -> AppResult<Json<Transaction>> {
    let transaction = state
        .services
        .transactions
        .extend_due_date(id, request.new_due_date)
        .await?;
    Ok(Json(transaction))
}

/// Mark the late fee as paid
#[utoipa::path(
    post,
    path = "/transactions/{id}/pay-late-fee",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "Transaction ID")
    ),
    responses(
        (status = 200, description = "Late fee marked paid", body = Transaction),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn pay_late_fee(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Transaction>> {
    let transaction = state.services.transactions.mark_late_fee_paid(id).await?;
    Ok(Json(transaction))
}

/// Transaction history for one user
#[utoipa::path(
    get,
    path = "/users/{id}/transactions",
    tag = "transactions",
    params(
        ("id" = i32, Path, description = "User ID"),
        UserTransactionsQuery
    ),
    responses(
        (status = 200, description = "User's transactions", body = Vec<Transaction>),
        (status = 404, description = "User not found")
    )
)]
pub async fn user_transactions(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<UserTransactionsQuery>,
) -> AppResult<Json<Vec<Transaction>>> {
    let transactions = state
        .services
        .transactions
        .user_transactions(user_id, query.status)
        .await?;
    Ok(Json(transactions))
}
