//! Item (trackable asset) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::ItemStatus;

/// Item record from database.
///
/// Invariant: `current_holder_id` is set if and only if `status` is lent.
/// Only the loan lifecycle engine and the maintenance workflow mutate
/// status and holder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    /// Institutional inventory number (unique barcode/tag)
    pub inventory_number: String,
    pub name: String,
    pub location: Option<String>,
    pub status: ItemStatus,
    pub current_holder_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
