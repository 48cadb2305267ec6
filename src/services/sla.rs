//! SLA engine for maintenance requests
//!
//! Assigns response/resolution deadlines from the priority tier at
//! creation, records first-response and resolution events, and sweeps for
//! requests that silently expired without any status-changing action.

use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        enums::{MaintenancePriority, MaintenanceStatus},
        maintenance::{
            MaintenanceRequest, MaintenanceStatistics, NewMaintenanceRequest, SlaStatistics,
            SlaTimeRemaining,
        },
    },
    repository::Repository,
    services::notifications::{try_notify, NotificationEvent, Notifier},
};

#[derive(Clone)]
pub struct SlaService {
    repository: Repository,
    notifier: Arc<dyn Notifier>,
    time: Arc<SafeTimeProvider>,
}

impl SlaService {
    pub fn new(
        repository: Repository,
        notifier: Arc<dyn Notifier>,
        time: Arc<SafeTimeProvider>,
    ) -> Self {
        Self {
            repository,
            notifier,
            time,
        }
    }

    /// Get a maintenance request by ID
    pub async fn get(&self, id: i32) -> AppResult<MaintenanceRequest> {
        self.repository.maintenance.get_by_id(id).await
    }

    /// List maintenance requests with optional filters
    pub async fn list(
        &self,
        status: Option<MaintenanceStatus>,
        priority: Option<MaintenancePriority>,
        item_id: Option<i32>,
    ) -> AppResult<Vec<MaintenanceRequest>> {
        self.repository.maintenance.list(status, priority, item_id).await
    }

    /// Create a maintenance request with priority-derived SLA targets.
    /// Urgent requests pull an available item out of circulation
    /// immediately.
    pub async fn create_request(
        &self,
        data: NewMaintenanceRequest,
    ) -> AppResult<MaintenanceRequest> {
        let now = self.time.now();

        // Verify item exists
        self.repository.items.get_by_id(data.item_id).await?;

        let mut request = self.repository.maintenance.create(&data, now).await?;
        request.set_sla(now);
        self.repository.maintenance.save_sla(&request).await?;

        if data.priority == MaintenancePriority::Urgent {
            let quarantined = self
                .repository
                .items
                .quarantine_if_available(data.item_id, now)
                .await?;
            if quarantined {
                tracing::info!(
                    item_id = data.item_id,
                    request_id = request.id,
                    "Item quarantined for urgent maintenance"
                );
            }
        }

        tracing::info!(
            request_id = request.id,
            priority = %request.priority,
            sla_due_date = ?request.sla_due_date,
            "Maintenance request created"
        );

        Ok(request)
    }

    /// Assign a request to a technician. Leaving `pending` records the
    /// first response and checks it against the SLA deadline.
    pub async fn assign(&self, id: i32, assigned_to: i32) -> AppResult<MaintenanceRequest> {
        let now = self.time.now();
        let assignee = self.repository.users.get_by_id(assigned_to).await?;

        let (mut request, old_status) = self.repository.maintenance.assign(id, assigned_to).await?;

        if old_status == MaintenanceStatus::Pending {
            request.record_first_response(now);
            self.repository.maintenance.save_sla(&request).await?;

            if request.sla_breached {
                tracing::warn!(
                    request_id = request.id,
                    priority = %request.priority,
                    reason = ?request.sla_breach_reason,
                    "SLA breached for maintenance request"
                );
            }
        }

        if let Ok(item) = self.repository.items.get_by_id(request.item_id).await {
            let event = NotificationEvent::MaintenanceAssigned {
                item_name: item.name,
                priority: request.priority,
            };
            try_notify(self.notifier.as_ref(), &assignee, event).await;
        }

        Ok(request)
    }

    /// Complete an in-progress request, record the resolution against the
    /// SLA target, and release a quarantined item back into circulation.
    pub async fn complete(
        &self,
        id: i32,
        resolution_notes: Option<String>,
        cost: Option<Decimal>,
    ) -> AppResult<MaintenanceRequest> {
        let now = self.time.now();

        let mut request = self
            .repository
            .maintenance
            .complete(id, resolution_notes, cost)
            .await?;

        request.record_resolution(now);
        self.repository.maintenance.save_sla(&request).await?;

        if request.sla_breached {
            tracing::warn!(
                request_id = request.id,
                priority = %request.priority,
                reason = ?request.sla_breach_reason,
                "SLA breached for maintenance request"
            );
        }

        let released = self
            .repository
            .items
            .release_from_maintenance(request.item_id, now)
            .await?;
        if released {
            tracing::info!(
                item_id = request.item_id,
                request_id = request.id,
                "Item released from maintenance"
            );
        }

        if let Some(requester_id) = request.requested_by {
            if let (Ok(requester), Ok(item)) = (
                self.repository.users.get_by_id(requester_id).await,
                self.repository.items.get_by_id(request.item_id).await,
            ) {
                let event = NotificationEvent::MaintenanceCompleted {
                    item_name: item.name,
                };
                try_notify(self.notifier.as_ref(), &requester, event).await;
            }
        }

        Ok(request)
    }

    /// Cancel an open request and release a quarantined item
    pub async fn cancel(&self, id: i32) -> AppResult<MaintenanceRequest> {
        let now = self.time.now();
        let request = self.repository.maintenance.cancel(id).await?;

        self.repository
            .items
            .release_from_maintenance(request.item_id, now)
            .await?;

        tracing::info!(request_id = request.id, "Maintenance request cancelled");
        Ok(request)
    }

    /// Periodic sweep: breach every non-breached request that silently
    /// exceeded its first-response or resolution deadline. Returns the
    /// number of newly-breached requests.
    pub async fn check_sla_breaches(&self) -> AppResult<u32> {
        let now = self.time.now();

        let pending = self
            .repository
            .maintenance
            .breach_overdue_pending(now, "First response SLA exceeded")
            .await?;
        for id in &pending {
            tracing::warn!(request_id = id, "SLA breached: first response overdue");
        }

        let in_progress = self
            .repository
            .maintenance
            .breach_overdue_in_progress(now, "Resolution SLA exceeded")
            .await?;
        for id in &in_progress {
            tracing::warn!(request_id = id, "SLA breached: resolution overdue");
        }

        let newly_breached = (pending.len() + in_progress.len()) as u32;
        tracing::info!(newly_breached, "SLA sweep completed");

        Ok(newly_breached)
    }

    /// Workload overview across all maintenance requests
    pub async fn overview(&self) -> AppResult<MaintenanceStatistics> {
        self.repository.maintenance.overview().await
    }

    /// Aggregate SLA compliance metrics
    pub async fn statistics(&self) -> AppResult<SlaStatistics> {
        self.repository.maintenance.statistics(self.time.now()).await
    }

    /// Time remaining until the first-response deadline for one request
    pub async fn time_remaining(&self, id: i32) -> AppResult<Option<SlaTimeRemaining>> {
        let request = self.repository.maintenance.get_by_id(id).await?;
        Ok(request.time_remaining(self.time.now()))
    }
}
