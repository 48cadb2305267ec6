//! Shared domain status enums
//!
//! Every status column is a Postgres enum type mirrored here so that
//! illegal states are unrepresentable and transition tables stay
//! exhaustive-checkable.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

/// Availability state of a trackable asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "item_status", rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Lent,
    Maintenance,
    Retired,
    Donated,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ItemStatus::Available => "available",
            ItemStatus::Lent => "lent",
            ItemStatus::Maintenance => "maintenance",
            ItemStatus::Retired => "retired",
            ItemStatus::Donated => "donated",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// TransactionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a loan. Terminal states: returned, late_return,
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
pub enum TransactionStatus {
    Active,
    Overdue,
    Returned,
    LateReturn,
    Cancelled,
}

impl TransactionStatus {
    /// Whether the item is still out with the borrower
    pub fn is_open(self) -> bool {
        matches!(self, TransactionStatus::Active | TransactionStatus::Overdue)
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            TransactionStatus::Active => "active",
            TransactionStatus::Overdue => "overdue",
            TransactionStatus::Returned => "returned",
            TransactionStatus::LateReturn => "late_return",
            TransactionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// ReturnCondition
// ---------------------------------------------------------------------------

/// Condition of an item as assessed at return time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "return_condition", rename_all = "snake_case")]
pub enum ReturnCondition {
    Excellent,
    Good,
    Fair,
    Poor,
    Damaged,
}

impl ReturnCondition {
    pub const ALL: [&'static str; 5] = ["excellent", "good", "fair", "poor", "damaged"];

    /// Poor and damaged items are quarantined on return instead of going
    /// back into circulation.
    pub fn requires_maintenance(self) -> bool {
        matches!(self, ReturnCondition::Poor | ReturnCondition::Damaged)
    }

    /// Item status to apply once this condition is recorded
    pub fn next_item_status(self) -> ItemStatus {
        if self.requires_maintenance() {
            ItemStatus::Maintenance
        } else {
            ItemStatus::Available
        }
    }
}

impl FromStr for ReturnCondition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "excellent" => Ok(ReturnCondition::Excellent),
            "good" => Ok(ReturnCondition::Good),
            "fair" => Ok(ReturnCondition::Fair),
            "poor" => Ok(ReturnCondition::Poor),
            "damaged" => Ok(ReturnCondition::Damaged),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ReturnCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ReturnCondition::Excellent => "excellent",
            ReturnCondition::Good => "good",
            ReturnCondition::Fair => "fair",
            ReturnCondition::Poor => "poor",
            ReturnCondition::Damaged => "damaged",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// MaintenancePriority
// ---------------------------------------------------------------------------

/// Priority tier of a maintenance request; drives SLA deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "maintenance_priority", rename_all = "snake_case")]
pub enum MaintenancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl MaintenancePriority {
    pub const ALL: [&'static str; 4] = ["low", "medium", "high", "urgent"];

    /// Hours allowed for a first response
    pub fn response_hours(self) -> i64 {
        match self {
            MaintenancePriority::Urgent => 2,
            MaintenancePriority::High => 4,
            MaintenancePriority::Medium => 24,
            MaintenancePriority::Low => 72,
        }
    }

    /// Hours allowed for full resolution
    pub fn resolution_hours(self) -> i64 {
        match self {
            MaintenancePriority::Urgent => 8,
            MaintenancePriority::High => 24,
            MaintenancePriority::Medium => 72,
            MaintenancePriority::Low => 168,
        }
    }
}

impl FromStr for MaintenancePriority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(MaintenancePriority::Low),
            "medium" => Ok(MaintenancePriority::Medium),
            "high" => Ok(MaintenancePriority::High),
            "urgent" => Ok(MaintenancePriority::Urgent),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for MaintenancePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MaintenancePriority::Low => "low",
            MaintenancePriority::Medium => "medium",
            MaintenancePriority::High => "high",
            MaintenancePriority::Urgent => "urgent",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// MaintenanceStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a maintenance request. Terminal states: completed,
/// cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "maintenance_status", rename_all = "snake_case")]
pub enum MaintenanceStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl MaintenanceStatus {
    pub fn is_open(self) -> bool {
        matches!(self, MaintenanceStatus::Pending | MaintenanceStatus::InProgress)
    }
}

impl std::fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MaintenanceStatus::Pending => "pending",
            MaintenanceStatus::InProgress => "in_progress",
            MaintenanceStatus::Completed => "completed",
            MaintenanceStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", label)
    }
}

// ---------------------------------------------------------------------------
// MaintenanceType
// ---------------------------------------------------------------------------

/// Nature of the service work requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "maintenance_type", rename_all = "snake_case")]
pub enum MaintenanceType {
    HardwareFailure,
    SoftwareIssue,
    RoutineCleaning,
    ConsumableReplacement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damaged_and_poor_returns_are_quarantined() {
        assert_eq!(ReturnCondition::Damaged.next_item_status(), ItemStatus::Maintenance);
        assert_eq!(ReturnCondition::Poor.next_item_status(), ItemStatus::Maintenance);
        assert_eq!(ReturnCondition::Fair.next_item_status(), ItemStatus::Available);
        assert_eq!(ReturnCondition::Good.next_item_status(), ItemStatus::Available);
        assert_eq!(ReturnCondition::Excellent.next_item_status(), ItemStatus::Available);
    }

    #[test]
    fn return_condition_parses_known_values_only() {
        assert_eq!("damaged".parse::<ReturnCondition>(), Ok(ReturnCondition::Damaged));
        assert!("pristine".parse::<ReturnCondition>().is_err());
        assert!("Good".parse::<ReturnCondition>().is_err());
    }

    #[test]
    fn sla_hours_follow_priority_tiers() {
        assert_eq!(MaintenancePriority::Urgent.response_hours(), 2);
        assert_eq!(MaintenancePriority::High.response_hours(), 4);
        assert_eq!(MaintenancePriority::Medium.response_hours(), 24);
        assert_eq!(MaintenancePriority::Low.response_hours(), 72);

        assert_eq!(MaintenancePriority::Urgent.resolution_hours(), 8);
        assert_eq!(MaintenancePriority::High.resolution_hours(), 24);
        assert_eq!(MaintenancePriority::Medium.resolution_hours(), 72);
        assert_eq!(MaintenancePriority::Low.resolution_hours(), 168);
    }
}
