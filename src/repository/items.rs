//! Items repository for database operations
//!
//! Item creation and editing belong to the inventory management surface,
//! which is out of scope here; this repository only covers lookups and
//! the two status moves the maintenance workflow needs. Checkout/return
//! status flips happen inside the transactions repository so they share
//! the loan's database transaction.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{enums::ItemStatus, item::Item},
};

#[derive(Clone)]
pub struct ItemsRepository {
    pool: Pool<Postgres>,
}

impl ItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get item by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", id)))
    }

    /// List items, optionally filtered by status
    pub async fn list(&self, status: Option<ItemStatus>) -> AppResult<Vec<Item>> {
        let items = match status {
            Some(status) => {
                sqlx::query_as::<_, Item>(
                    "SELECT * FROM items WHERE status = $1 ORDER BY inventory_number",
                )
                .bind(status)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY inventory_number")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(items)
    }

    /// Quarantine an available item for maintenance work.
    /// No-op when the item is lent or otherwise out of circulation.
    pub async fn quarantine_if_available(&self, id: i32, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE items SET status = 'maintenance', updated_at = $2 WHERE id = $1 AND status = 'available'",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release a quarantined item back into circulation
    pub async fn release_from_maintenance(&self, id: i32, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE items SET status = 'available', updated_at = $2 WHERE id = $1 AND status = 'maintenance'",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
