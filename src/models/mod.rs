//! Data models for Inventra

pub mod enums;
pub mod item;
pub mod maintenance;
pub mod transaction;
pub mod user;

// Re-export commonly used types
pub use enums::{
    ItemStatus, MaintenancePriority, MaintenanceStatus, MaintenanceType, ReturnCondition,
    TransactionStatus,
};
pub use item::Item;
pub use maintenance::{MaintenanceRequest, MaintenanceStatistics, SlaStatistics, SlaTimeRemaining};
pub use transaction::{OverdueSweepOutcome, Transaction};
pub use user::User;
