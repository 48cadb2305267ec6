//! Transaction (loan) model and lifecycle transition logic
//!
//! A transaction is one checkout-to-return episode binding an item to a
//! borrowing user. All temporal math lives here as pure functions over an
//! explicit `now` so the engine stays deterministic under a test clock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{ReturnCondition, TransactionStatus};

/// Transaction record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Transaction {
    pub id: i32,
    pub item_id: i32,
    pub user_id: i32,
    pub checkout_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub return_notes: Option<String>,
    pub status: TransactionStatus,
    /// Accrued late fee; stays 0 unless the loan completed late
    pub late_fee: Decimal,
    pub late_fee_paid: bool,
    pub return_condition: Option<ReturnCondition>,
    /// Staff member who performed the checkout
    pub checked_out_by: Option<i32>,
    /// Staff member who received the return
    pub returned_to: Option<i32>,
    pub checkout_notified: bool,
    pub overdue_notified: bool,
    pub return_notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether the loan is open with its due date in the past
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.due_date < now
    }

    /// Whole days overdue.
    ///
    /// A completed late return is measured against its return date; an open
    /// overdue loan against `now`. The reference point is never recomputed
    /// retroactively after return.
    pub fn days_overdue(&self, now: DateTime<Utc>) -> i64 {
        if self.status == TransactionStatus::LateReturn {
            if let Some(returned) = self.return_date {
                return (returned - self.due_date).num_days().max(0);
            }
        }
        if self.is_overdue(now) {
            return (now - self.due_date).num_days().max(0);
        }
        0
    }

    /// Late fee owed at `now`: days overdue times the per-day rate.
    /// Also used for live preview on open loans before return.
    pub fn late_fee_due(&self, fee_per_day: Decimal, now: DateTime<Utc>) -> Decimal {
        Decimal::from(self.days_overdue(now)) * fee_per_day
    }

    /// Apply the return transition in place.
    ///
    /// Returned exactly at the due instant still counts as on time; the
    /// loan goes to `late_return` only once at least one whole day has
    /// elapsed past the due date, and the fee accrues per whole day.
    pub fn mark_returned(
        &mut self,
        condition: ReturnCondition,
        return_notes: Option<String>,
        returned_to: Option<i32>,
        fee_per_day: Decimal,
        now: DateTime<Utc>,
    ) {
        self.return_date = Some(now);
        self.return_condition = Some(condition);
        self.return_notes = return_notes;
        self.returned_to = returned_to;

        let days_late = (now - self.due_date).num_days().max(0);
        if days_late > 0 {
            self.status = TransactionStatus::LateReturn;
            self.late_fee = Decimal::from(days_late) * fee_per_day;
        } else {
            self.status = TransactionStatus::Returned;
        }
    }
}

/// Data for creating a transaction via checkout
#[derive(Debug, Clone)]
pub struct CheckoutData {
    pub item_id: i32,
    pub user_id: i32,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub checked_out_by: Option<i32>,
}

/// Filters for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub status: Option<TransactionStatus>,
    pub user_id: Option<i32>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// Live late-fee preview for a loan, computed against the current clock
/// for open loans and against the return date for completed ones
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LateFeePreview {
    pub transaction_id: i32,
    pub days_overdue: i64,
    pub fee_per_day: Decimal,
    pub amount: Decimal,
}

/// Outcome counts of one overdue sweep run
#[derive(Debug, Clone, Copy, Default, Serialize, ToSchema)]
pub struct OverdueSweepOutcome {
    /// Loans newly transitioned from active to overdue
    pub transactions_updated: u32,
    pub notifications_sent: u32,
    pub notifications_failed: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn open_loan(checkout: DateTime<Utc>, due: DateTime<Utc>) -> Transaction {
        Transaction {
            id: 1,
            item_id: 10,
            user_id: 20,
            checkout_date: checkout,
            due_date: due,
            return_date: None,
            notes: None,
            return_notes: None,
            status: TransactionStatus::Active,
            late_fee: Decimal::ZERO,
            late_fee_paid: false,
            return_condition: None,
            checked_out_by: None,
            returned_to: None,
            checkout_notified: false,
            overdue_notified: false,
            return_notified: false,
            created_at: checkout,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn return_exactly_at_due_date_is_on_time() {
        let due = t0() + Duration::days(14);
        let mut loan = open_loan(t0(), due);

        loan.mark_returned(ReturnCondition::Good, None, None, dec!(1.00), due);

        assert_eq!(loan.status, TransactionStatus::Returned);
        assert_eq!(loan.late_fee, Decimal::ZERO);
        assert_eq!(loan.return_date, Some(due));
    }

    #[test]
    fn return_one_day_late_charges_one_day() {
        let due = t0() + Duration::days(14);
        let mut loan = open_loan(t0(), due);

        loan.mark_returned(ReturnCondition::Good, None, None, dec!(1.00), due + Duration::days(1));

        assert_eq!(loan.status, TransactionStatus::LateReturn);
        assert_eq!(loan.late_fee, dec!(1.00));
    }

    #[test]
    fn return_under_a_whole_day_late_is_still_on_time() {
        let due = t0() + Duration::days(14);
        let mut loan = open_loan(t0(), due);

        loan.mark_returned(ReturnCondition::Good, None, None, dec!(1.00), due + Duration::hours(23));

        assert_eq!(loan.status, TransactionStatus::Returned);
        assert_eq!(loan.late_fee, Decimal::ZERO);
    }

    #[test]
    fn backdated_loan_returned_ten_days_late() {
        // Due date ten days in the past relative to the return instant
        let due = t0() - Duration::days(10);
        let mut loan = open_loan(due - Duration::days(14), due);

        loan.mark_returned(ReturnCondition::Good, None, None, dec!(1.00), t0());

        assert_eq!(loan.status, TransactionStatus::LateReturn);
        assert_eq!(loan.late_fee, dec!(10.00));
        assert_eq!(loan.days_overdue(t0() + Duration::days(30)), 10);
    }

    #[test]
    fn days_overdue_for_completed_loan_ignores_the_clock() {
        let due = t0();
        let mut loan = open_loan(t0() - Duration::days(7), due);
        loan.mark_returned(ReturnCondition::Fair, None, None, dec!(1.00), due + Duration::days(3));

        // Fee stays pinned to the return date no matter how much later we ask
        let much_later = due + Duration::days(365);
        assert_eq!(loan.days_overdue(much_later), 3);
        assert_eq!(loan.late_fee_due(dec!(1.00), much_later), dec!(3.00));
    }

    #[test]
    fn open_loan_fee_preview_tracks_now() {
        let due = t0();
        let loan = open_loan(t0() - Duration::days(7), due);

        assert_eq!(loan.late_fee_due(dec!(1.00), due), Decimal::ZERO);
        assert_eq!(loan.late_fee_due(dec!(1.00), due + Duration::days(2)), dec!(2.00));
        assert_eq!(loan.late_fee_due(dec!(0.50), due + Duration::days(4)), dec!(2.00));
    }

    #[test]
    fn fee_preview_works_before_sweep_flips_the_status() {
        // Still marked active even though the due date passed: the fee is
        // computed live from the due date, not from the status flip.
        let due = t0();
        let mut loan = open_loan(t0() - Duration::days(7), due);
        assert_eq!(loan.days_overdue(due + Duration::days(5)), 5);

        loan.status = TransactionStatus::Overdue;
        assert_eq!(loan.days_overdue(due + Duration::days(5)), 5);
    }

    #[test]
    fn terminal_states_never_accrue() {
        let due = t0();
        let mut loan = open_loan(t0() - Duration::days(7), due);
        loan.status = TransactionStatus::Cancelled;
        assert_eq!(loan.days_overdue(due + Duration::days(30)), 0);

        loan.status = TransactionStatus::Returned;
        assert_eq!(loan.late_fee_due(dec!(1.00), due + Duration::days(30)), Decimal::ZERO);
    }
}
