//! Item lookup endpoints
//!
//! Item creation and editing belong to the inventory management surface,
//! which lives outside this server.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::{enums::ItemStatus, item::Item}};

#[derive(Deserialize, IntoParams)]
pub struct ListItemsQuery {
    /// Filter by availability status
    pub status: Option<ItemStatus>,
}

/// List items
#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Items", body = Vec<Item>)
    )
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<Item>>> {
    let items = state.services.repository.items.list(query.status).await?;
    Ok(Json(items))
}

/// Get a single item
#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    params(
        ("id" = i32, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item", body = Item),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Item>> {
    let item = state.services.repository.items.get_by_id(id).await?;
    Ok(Json(item))
}
