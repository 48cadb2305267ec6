//! Loan lifecycle engine
//!
//! The single authority for loan state transitions, item availability and
//! late-fee computation. Interactive operations commit their state change
//! first and then attempt notification delivery; the periodic overdue
//! sweep promotes active loans past their due date and retries failed
//! overdue notifications on subsequent runs.

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{ReturnCondition, TransactionStatus},
        transaction::{
            CheckoutData, LateFeePreview, OverdueSweepOutcome, Transaction, TransactionFilter,
        },
    },
    repository::Repository,
    services::notifications::{try_notify, NotificationEvent, Notifier},
};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    time: Arc<SafeTimeProvider>,
    fee_per_day: Decimal,
}

impl TransactionsService {
    pub fn new(
        repository: Repository,
        notifier: Arc<dyn Notifier>,
        time: Arc<SafeTimeProvider>,
        fee_per_day: Decimal,
    ) -> Self {
        Self {
            repository,
            notifier,
            time,
            fee_per_day,
        }
    }

    /// Get a transaction by ID
    pub async fn get(&self, id: i32) -> AppResult<Transaction> {
        self.repository.transactions.get_by_id(id).await
    }

    /// List transactions with optional filters
    pub async fn list(&self, filter: &TransactionFilter) -> AppResult<Vec<Transaction>> {
        self.repository.transactions.list(filter).await
    }

    /// Transaction history for one user
    pub async fn user_transactions(
        &self,
        user_id: i32,
        status: Option<TransactionStatus>,
    ) -> AppResult<Vec<Transaction>> {
        // Verify user exists
        self.repository.users.get_by_id(user_id).await?;
        let filter = TransactionFilter {
            status,
            user_id: Some(user_id),
            ..Default::default()
        };
        self.repository.transactions.list(&filter).await
    }

    /// Loans currently out past their due date
    pub async fn overdue_list(&self) -> AppResult<Vec<Transaction>> {
        self.repository.transactions.overdue_list(self.time.now()).await
    }

    /// Check out an item to a user
    pub async fn checkout(&self, data: CheckoutData) -> AppResult<Transaction> {
        let now = self.time.now();

        if data.due_date <= now {
            return Err(AppError::InvalidState(
                "Due date must be in the future".to_string(),
            ));
        }

        let user = self.repository.users.get_by_id(data.user_id).await?;
        let (transaction, item) = self.repository.transactions.checkout(&data, now).await?;

        tracing::info!(
            transaction_id = transaction.id,
            item_id = item.id,
            user_id = user.id,
            "Item checked out"
        );

        // Best-effort confirmation after commit
        let event = NotificationEvent::Checkout {
            item_name: item.name.clone(),
            due_date: transaction.due_date,
        };
        if try_notify(self.notifier.as_ref(), &user, event).await {
            if let Err(e) = self
                .repository
                .transactions
                .set_checkout_notified(transaction.id)
                .await
            {
                tracing::warn!(
                    transaction_id = transaction.id,
                    "Failed to record checkout notification flag: {}",
                    e
                );
            }
        }

        Ok(transaction)
    }

    /// Return a borrowed item
    pub async fn return_item(
        &self,
        id: i32,
        condition: &str,
        return_notes: Option<String>,
        returned_to: Option<i32>,
    ) -> AppResult<Transaction> {
        let condition: ReturnCondition = condition.parse().map_err(|_| {
            AppError::Validation(format!(
                "Invalid condition. Must be one of: {}",
                ReturnCondition::ALL.join(", ")
            ))
        })?;

        let now = self.time.now();
        let (transaction, item) = self
            .repository
            .transactions
            .return_item(id, condition, return_notes, returned_to, self.fee_per_day, now)
            .await?;

        let late = transaction.status == TransactionStatus::LateReturn;
        tracing::info!(
            transaction_id = transaction.id,
            item_id = item.id,
            condition = %condition,
            late,
            "Item returned"
        );

        match self.repository.users.get_by_id(transaction.user_id).await {
            Ok(user) => {
                let event = NotificationEvent::Return {
                    item_name: item.name.clone(),
                    late,
                    late_fee: transaction.late_fee,
                };
                if try_notify(self.notifier.as_ref(), &user, event).await {
                    if let Err(e) = self
                        .repository
                        .transactions
                        .set_return_notified(transaction.id)
                        .await
                    {
                        tracing::warn!(
                            transaction_id = transaction.id,
                            "Failed to record return notification flag: {}",
                            e
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(
                    transaction_id = transaction.id,
                    "Could not load borrower for return notification: {}",
                    e
                );
            }
        }

        Ok(transaction)
    }

    /// Cancel an active transaction before the item is picked up
    pub async fn cancel(&self, id: i32) -> AppResult<Transaction> {
        let (transaction, _item) = self.repository.transactions.cancel(id, self.time.now()).await?;
        tracing::info!(transaction_id = transaction.id, "Transaction cancelled");
        Ok(transaction)
    }

    /// Extend the due date of an open loan
    pub async fn extend_due_date(
        &self,
        id: i32,
        new_due_date: DateTime<Utc>,
    ) -> AppResult<Transaction> {
        let transaction = self
            .repository
            .transactions
            .extend_due_date(id, new_due_date, self.time.now())
            .await?;
        tracing::info!(
            transaction_id = transaction.id,
            new_due_date = %new_due_date,
            "Due date extended"
        );
        Ok(transaction)
    }

    /// Mark the late fee as paid
    pub async fn mark_late_fee_paid(&self, id: i32) -> AppResult<Transaction> {
        self.repository.transactions.mark_fee_paid(id).await
    }

    /// Live late-fee preview for a loan
    pub async fn late_fee_preview(&self, id: i32) -> AppResult<LateFeePreview> {
        let transaction = self.repository.transactions.get_by_id(id).await?;
        let now = self.time.now();
        Ok(LateFeePreview {
            transaction_id: transaction.id,
            days_overdue: transaction.days_overdue(now),
            fee_per_day: self.fee_per_day,
            amount: transaction.late_fee_due(self.fee_per_day, now),
        })
    }

    /// Periodic sweep: promote active loans past due to overdue and send
    /// one overdue notification per loan.
    ///
    /// The status flip happens regardless of notification outcome; the
    /// notified flag is only set on successful delivery, so the next run
    /// retries the notification without re-counting the transition.
    /// One loan's failure never aborts the sweep.
    pub async fn update_overdue_status(&self) -> AppResult<OverdueSweepOutcome> {
        let now = self.time.now();
        let loans = self.repository.transactions.select_for_overdue_sweep(now).await?;

        let mut outcome = OverdueSweepOutcome::default();

        for loan in loans {
            match self.repository.transactions.mark_overdue(loan.id).await {
                Ok(true) => outcome.transactions_updated += 1,
                Ok(false) => {} // already overdue from an earlier run
                Err(e) => {
                    tracing::error!(
                        transaction_id = loan.id,
                        "Failed to mark transaction overdue: {}",
                        e
                    );
                    continue;
                }
            }

            let user = match self.repository.users.get_by_id(loan.user_id).await {
                Ok(user) => user,
                Err(e) => {
                    tracing::error!(
                        transaction_id = loan.id,
                        "Could not load borrower for overdue notification: {}",
                        e
                    );
                    outcome.notifications_failed += 1;
                    continue;
                }
            };
            let item = match self.repository.items.get_by_id(loan.item_id).await {
                Ok(item) => item,
                Err(e) => {
                    tracing::error!(
                        transaction_id = loan.id,
                        "Could not load item for overdue notification: {}",
                        e
                    );
                    outcome.notifications_failed += 1;
                    continue;
                }
            };

            let event = NotificationEvent::Overdue {
                item_name: item.name,
                due_date: loan.due_date,
                days_overdue: loan.days_overdue(now),
            };

            if try_notify(self.notifier.as_ref(), &user, event).await {
                match self.repository.transactions.set_overdue_notified(loan.id).await {
                    Ok(()) => outcome.notifications_sent += 1,
                    Err(e) => {
                        tracing::error!(
                            transaction_id = loan.id,
                            "Failed to record overdue notification flag: {}",
                            e
                        );
                        outcome.notifications_failed += 1;
                    }
                }
            } else {
                outcome.notifications_failed += 1;
            }
        }

        tracing::info!(
            updated = outcome.transactions_updated,
            sent = outcome.notifications_sent,
            failed = outcome.notifications_failed,
            "Overdue sweep completed"
        );

        Ok(outcome)
    }
}
