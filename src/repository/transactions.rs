//! Transactions (loans) repository for database operations
//!
//! Every interactive lifecycle operation runs inside one database
//! transaction covering both the loan row and the item row, with the item
//! locked `FOR UPDATE` so concurrent checkouts against the same item
//! serialize: the loser observes a non-available status and fails.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{ItemStatus, ReturnCondition, TransactionStatus},
        item::Item,
        transaction::{CheckoutData, Transaction, TransactionFilter},
    },
};

#[derive(Clone)]
pub struct TransactionsRepository {
    pool: Pool<Postgres>,
}

impl TransactionsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get transaction by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Transaction> {
        sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
    }

    /// Check out an item: create the loan and flip the item to lent,
    /// atomically. Borrower policy checks run inside the same transaction
    /// so they see a consistent snapshot.
    pub async fn checkout(
        &self,
        data: &CheckoutData,
        now: DateTime<Utc>,
    ) -> AppResult<(Transaction, Item)> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1 FOR UPDATE")
            .bind(data.item_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {} not found", data.item_id)))?;

        if item.status != ItemStatus::Available {
            return Err(AppError::InvalidState(format!(
                "Item is not available for checkout. Current status: {}",
                item.status
            )));
        }

        let overdue_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transactions WHERE user_id = $1 AND status = 'overdue'",
        )
        .bind(data.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if overdue_count > 0 {
            return Err(AppError::PolicyViolation(format!(
                "User has {} overdue item(s). Please return them first.",
                overdue_count
            )));
        }

        let unpaid_fees: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(late_fee), 0) FROM transactions WHERE user_id = $1 AND late_fee > 0 AND late_fee_paid = FALSE",
        )
        .bind(data.user_id)
        .fetch_one(&mut *tx)
        .await?;

        if unpaid_fees > Decimal::ZERO {
            return Err(AppError::PolicyViolation(format!(
                "User has unpaid late fees: {:.2}",
                unpaid_fees
            )));
        }

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions
                (item_id, user_id, checkout_date, due_date, notes, status, late_fee, late_fee_paid, checked_out_by)
            VALUES ($1, $2, $3, $4, $5, 'active', 0, FALSE, $6)
            RETURNING *
            "#,
        )
        .bind(data.item_id)
        .bind(data.user_id)
        .bind(now)
        .bind(data.due_date)
        .bind(&data.notes)
        .bind(data.checked_out_by)
        .fetch_one(&mut *tx)
        .await?;

        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET status = 'lent', current_holder_id = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(data.user_id)
        .bind(now)
        .bind(data.item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((transaction, item))
    }

    /// Return a loan: record the return on the loan and release or
    /// quarantine the item, atomically.
    pub async fn return_item(
        &self,
        id: i32,
        condition: ReturnCondition,
        return_notes: Option<String>,
        returned_to: Option<i32>,
        fee_per_day: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<(Transaction, Item)> {
        let mut tx = self.pool.begin().await?;

        let mut loan =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        if !loan.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Transaction is not active. Current status: {}",
                loan.status
            )));
        }

        loan.mark_returned(condition, return_notes, returned_to, fee_per_day, now);

        let loan = sqlx::query_as::<_, Transaction>(
            r#"
            UPDATE transactions
            SET return_date = $1, return_condition = $2, return_notes = $3,
                returned_to = $4, status = $5, late_fee = $6
            WHERE id = $7
            RETURNING *
            "#,
        )
        .bind(loan.return_date)
        .bind(loan.return_condition)
        .bind(&loan.return_notes)
        .bind(loan.returned_to)
        .bind(loan.status)
        .bind(loan.late_fee)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET status = $1, current_holder_id = NULL, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(condition.next_item_status())
        .bind(now)
        .bind(loan.item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((loan, item))
    }

    /// Cancel an active loan and free the item. Overdue loans cannot be
    /// cancelled; they must go through a return.
    pub async fn cancel(&self, id: i32, now: DateTime<Utc>) -> AppResult<(Transaction, Item)> {
        let mut tx = self.pool.begin().await?;

        let loan =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        if loan.status != TransactionStatus::Active {
            return Err(AppError::InvalidState(format!(
                "Can only cancel active transactions. Current status: {}",
                loan.status
            )));
        }

        let loan = sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET status = 'cancelled', return_date = $1 WHERE id = $2 RETURNING *",
        )
        .bind(now)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET status = 'available', current_holder_id = NULL, updated_at = $1 WHERE id = $2 RETURNING *",
        )
        .bind(now)
        .bind(loan.item_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((loan, item))
    }

    /// Extend the due date of an open loan. Extension is a full reset of
    /// delinquency: the status goes back to active. The overdue_notified
    /// flag is deliberately left untouched.
    pub async fn extend_due_date(
        &self,
        id: i32,
        new_due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        let mut tx = self.pool.begin().await?;

        let loan =
            sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

        if !loan.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Can only extend active or overdue transactions. Current status: {}",
                loan.status
            )));
        }

        if new_due_date <= now {
            return Err(AppError::InvalidState(
                "New due date must be in the future".to_string(),
            ));
        }

        if new_due_date <= loan.due_date {
            return Err(AppError::InvalidState(
                "New due date must be after current due date".to_string(),
            ));
        }

        let loan = sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET due_date = $1, status = 'active' WHERE id = $2 RETURNING *",
        )
        .bind(new_due_date)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(loan)
    }

    /// Mark the late fee as paid
    pub async fn mark_fee_paid(&self, id: i32) -> AppResult<Transaction> {
        sqlx::query_as::<_, Transaction>(
            "UPDATE transactions SET late_fee_paid = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))
    }

    /// List transactions with optional filters, newest first
    pub async fn list(&self, filter: &TransactionFilter) -> AppResult<Vec<Transaction>> {
        let mut sql = String::from("SELECT * FROM transactions WHERE 1 = 1");
        let mut idx = 0;

        if filter.status.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND status = ${}", idx));
        }
        if filter.user_id.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND user_id = ${}", idx));
        }
        if filter.date_from.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND checkout_date >= ${}", idx));
        }
        if filter.date_to.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND checkout_date <= ${}", idx));
        }
        sql.push_str(" ORDER BY checkout_date DESC");

        let mut query = sqlx::query_as::<_, Transaction>(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status);
        }
        if let Some(user_id) = filter.user_id {
            query = query.bind(user_id);
        }
        if let Some(from) = filter.date_from {
            query = query.bind(from);
        }
        if let Some(to) = filter.date_to {
            query = query.bind(to);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Loans currently out past their due date, soonest-due first
    pub async fn overdue_list(&self, now: DateTime<Utc>) -> AppResult<Vec<Transaction>> {
        let loans = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE status = 'overdue' OR (status = 'active' AND due_date < $1)
            ORDER BY due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Sweep selection: open loans past due that have not yet had their
    /// overdue notification delivered. Including already-overdue rows
    /// lets a failed notification be retried on the next run.
    pub async fn select_for_overdue_sweep(
        &self,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Transaction>> {
        let loans = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT * FROM transactions
            WHERE status IN ('active', 'overdue')
              AND due_date < $1
              AND overdue_notified = FALSE
            ORDER BY due_date
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        Ok(loans)
    }

    /// Promote an active loan to overdue. Guarded on the current status so
    /// a re-run or an overlapping return never double-processes.
    pub async fn mark_overdue(&self, id: i32) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE transactions SET status = 'overdue' WHERE id = $1 AND status = 'active'")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_checkout_notified(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE transactions SET checkout_notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_overdue_notified(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE transactions SET overdue_notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_return_notified(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE transactions SET return_notified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
