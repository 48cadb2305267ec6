//! Maintenance request model and SLA transition logic
//!
//! SLA deadlines are derived from priority at creation time. The breach
//! flag is one-way: once set it is never cleared, and the first recorded
//! reason wins.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::{MaintenancePriority, MaintenanceStatus, MaintenanceType};

/// Maintenance request record from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct MaintenanceRequest {
    pub id: i32,
    pub item_id: i32,
    pub requested_by: Option<i32>,
    pub assigned_to: Option<i32>,
    /// Loan whose return triggered this request, if any
    pub transaction_id: Option<i32>,
    pub maintenance_type: Option<MaintenanceType>,
    pub priority: MaintenancePriority,
    pub status: MaintenanceStatus,
    pub description: String,
    pub resolution_notes: Option<String>,
    pub cost: Option<Decimal>,
    pub sla_hours: Option<i32>,
    pub sla_due_date: Option<DateTime<Utc>>,
    pub resolution_target: Option<DateTime<Utc>>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub sla_breached: bool,
    pub sla_breach_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MaintenanceRequest {
    /// Assign response and resolution deadlines from the priority tier
    pub fn set_sla(&mut self, now: DateTime<Utc>) {
        let response_hours = self.priority.response_hours();
        self.sla_hours = Some(response_hours as i32);
        self.sla_due_date = Some(now + chrono::Duration::hours(response_hours));
        self.resolution_target = Some(now + chrono::Duration::hours(self.priority.resolution_hours()));
    }

    /// Record the first response once the request leaves `pending`.
    /// Fires at most once; late responses mark the SLA breached.
    pub fn record_first_response(&mut self, now: DateTime<Utc>) {
        if self.first_response_at.is_none() && self.status != MaintenanceStatus::Pending {
            self.first_response_at = Some(now);

            if let Some(due) = self.sla_due_date {
                if now > due {
                    self.mark_breached("First response exceeded SLA target");
                }
            }
        }
    }

    /// Record resolution once the request completes.
    /// Fires at most once; late resolutions mark the SLA breached.
    pub fn record_resolution(&mut self, now: DateTime<Utc>) {
        if self.status == MaintenanceStatus::Completed && self.resolved_at.is_none() {
            self.resolved_at = Some(now);

            if let Some(target) = self.resolution_target {
                if now > target {
                    self.mark_breached("Resolution exceeded SLA target");
                }
            }
        }
    }

    /// Flag the SLA as breached. Idempotent: the first reason is kept and
    /// never overwritten. Returns whether the flag was newly set.
    pub fn mark_breached(&mut self, reason: &str) -> bool {
        if self.sla_breached {
            return false;
        }
        self.sla_breached = true;
        self.sla_breach_reason = Some(reason.to_string());
        true
    }

    /// Time remaining until the first-response deadline, or None when the
    /// request carries no SLA.
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<SlaTimeRemaining> {
        let due = self.sla_due_date?;

        if now > due {
            let diff = now - due;
            let hours = diff.num_hours();
            let minutes = diff.num_minutes() % 60;
            return Some(SlaTimeRemaining {
                status: SlaHealth::Breached,
                hours: -hours,
                minutes: -minutes,
                is_overdue: true,
                formatted: format!(
                    "Overdue by {}d {}h {}m",
                    diff.num_days(),
                    hours % 24,
                    minutes
                ),
            });
        }

        let diff = due - now;
        let total_hours = diff.num_hours();
        let minutes = diff.num_minutes() % 60;
        let status = if total_hours <= 2 {
            SlaHealth::Critical
        } else if total_hours <= 4 {
            SlaHealth::Warning
        } else {
            SlaHealth::Normal
        };

        Some(SlaTimeRemaining {
            status,
            hours: total_hours,
            minutes,
            is_overdue: false,
            formatted: format!(
                "{}d {}h {}m remaining",
                diff.num_days(),
                total_hours % 24,
                minutes
            ),
        })
    }
}

/// Urgency bucket relative to the first-response deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SlaHealth {
    Breached,
    Critical,
    Warning,
    Normal,
}

/// Structured remaining/overdue summary for one request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlaTimeRemaining {
    pub status: SlaHealth,
    pub hours: i64,
    pub minutes: i64,
    pub is_overdue: bool,
    pub formatted: String,
}

/// Data for creating a maintenance request
#[derive(Debug, Clone)]
pub struct NewMaintenanceRequest {
    pub item_id: i32,
    pub requested_by: Option<i32>,
    pub transaction_id: Option<i32>,
    pub maintenance_type: Option<MaintenanceType>,
    pub priority: MaintenancePriority,
    pub description: String,
}

/// Workload overview across all maintenance requests
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MaintenanceStatistics {
    pub total_requests: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    /// Open requests at urgent priority
    pub urgent_open: i64,
    pub sla_breached: i64,
    /// Summed cost of completed work
    pub total_cost: Decimal,
}

/// Aggregate SLA compliance metrics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlaStatistics {
    pub total_requests: i64,
    pub sla_compliant: i64,
    pub sla_breached: i64,
    /// Open pending requests due within the next two hours
    pub at_risk_count: i64,
    pub average_response_hours: f64,
    pub average_resolution_hours: f64,
    /// (total - breached) / total * 100; 100 when there are no requests
    pub compliance_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn request(priority: MaintenancePriority) -> MaintenanceRequest {
        let mut req = MaintenanceRequest {
            id: 1,
            item_id: 10,
            requested_by: Some(3),
            assigned_to: None,
            transaction_id: None,
            maintenance_type: None,
            priority,
            status: MaintenanceStatus::Pending,
            description: "projector lamp flickers".to_string(),
            resolution_notes: None,
            cost: None,
            sla_hours: None,
            sla_due_date: None,
            resolution_target: None,
            first_response_at: None,
            resolved_at: None,
            sla_breached: false,
            sla_breach_reason: None,
            created_at: t0(),
        };
        req.set_sla(t0());
        req
    }

    #[test]
    fn urgent_request_gets_two_hour_response_and_eight_hour_resolution() {
        let req = request(MaintenancePriority::Urgent);
        assert_eq!(req.sla_hours, Some(2));
        assert_eq!(req.sla_due_date, Some(t0() + Duration::hours(2)));
        assert_eq!(req.resolution_target, Some(t0() + Duration::hours(8)));
    }

    #[test]
    fn first_response_is_not_recorded_while_pending() {
        let mut req = request(MaintenancePriority::High);
        req.record_first_response(t0() + Duration::hours(1));
        assert_eq!(req.first_response_at, None);
    }

    #[test]
    fn first_response_on_time_does_not_breach() {
        let mut req = request(MaintenancePriority::High);
        req.status = MaintenanceStatus::InProgress;
        req.record_first_response(t0() + Duration::hours(3));

        assert_eq!(req.first_response_at, Some(t0() + Duration::hours(3)));
        assert!(!req.sla_breached);
    }

    #[test]
    fn late_first_response_breaches_once() {
        let mut req = request(MaintenancePriority::Urgent);
        req.status = MaintenanceStatus::InProgress;
        req.record_first_response(t0() + Duration::hours(5));

        assert!(req.sla_breached);
        assert_eq!(
            req.sla_breach_reason.as_deref(),
            Some("First response exceeded SLA target")
        );

        // A second call must not move the timestamp
        let first = req.first_response_at;
        req.record_first_response(t0() + Duration::hours(9));
        assert_eq!(req.first_response_at, first);
    }

    #[test]
    fn late_resolution_breaches() {
        let mut req = request(MaintenancePriority::Urgent);
        req.status = MaintenanceStatus::Completed;
        req.record_resolution(t0() + Duration::hours(10));

        assert_eq!(req.resolved_at, Some(t0() + Duration::hours(10)));
        assert!(req.sla_breached);
        assert_eq!(
            req.sla_breach_reason.as_deref(),
            Some("Resolution exceeded SLA target")
        );
    }

    #[test]
    fn breach_reason_is_never_overwritten() {
        let mut req = request(MaintenancePriority::Low);
        assert!(req.mark_breached("First response SLA exceeded"));
        assert!(!req.mark_breached("Resolution SLA exceeded"));
        assert_eq!(
            req.sla_breach_reason.as_deref(),
            Some("First response SLA exceeded")
        );
    }

    #[test]
    fn time_remaining_buckets() {
        let req = request(MaintenancePriority::Low); // due in 72h

        let normal = req.time_remaining(t0()).unwrap();
        assert_eq!(normal.status, SlaHealth::Normal);
        assert!(!normal.is_overdue);
        assert_eq!(normal.formatted, "3d 0h 0m remaining");

        let warning = req.time_remaining(t0() + Duration::hours(69)).unwrap();
        assert_eq!(warning.status, SlaHealth::Warning);

        let critical = req.time_remaining(t0() + Duration::hours(71)).unwrap();
        assert_eq!(critical.status, SlaHealth::Critical);

        let breached = req
            .time_remaining(t0() + Duration::hours(73) + Duration::minutes(30))
            .unwrap();
        assert_eq!(breached.status, SlaHealth::Breached);
        assert!(breached.is_overdue);
        assert_eq!(breached.formatted, "Overdue by 0d 1h 30m");
    }
}
