//! Maintenance requests repository for database operations

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{MaintenancePriority, MaintenanceStatus},
        maintenance::{
            MaintenanceRequest, MaintenanceStatistics, NewMaintenanceRequest, SlaStatistics,
        },
    },
};

#[derive(Clone)]
pub struct MaintenanceRepository {
    pool: Pool<Postgres>,
}

impl MaintenanceRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get maintenance request by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<MaintenanceRequest> {
        sqlx::query_as::<_, MaintenanceRequest>("SELECT * FROM maintenance_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Maintenance request {} not found", id)))
    }

    /// Create a maintenance request in pending state
    pub async fn create(
        &self,
        data: &NewMaintenanceRequest,
        now: DateTime<Utc>,
    ) -> AppResult<MaintenanceRequest> {
        let request = sqlx::query_as::<_, MaintenanceRequest>(
            r#"
            INSERT INTO maintenance_requests
                (item_id, requested_by, transaction_id, maintenance_type, priority, status, description, created_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.item_id)
        .bind(data.requested_by)
        .bind(data.transaction_id)
        .bind(data.maintenance_type)
        .bind(data.priority)
        .bind(&data.description)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    /// List maintenance requests, optionally filtered
    pub async fn list(
        &self,
        status: Option<MaintenanceStatus>,
        priority: Option<MaintenancePriority>,
        item_id: Option<i32>,
    ) -> AppResult<Vec<MaintenanceRequest>> {
        let mut sql = String::from("SELECT * FROM maintenance_requests WHERE 1 = 1");
        let mut idx = 0;

        if status.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND status = ${}", idx));
        }
        if priority.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND priority = ${}", idx));
        }
        if item_id.is_some() {
            idx += 1;
            sql.push_str(&format!(" AND item_id = ${}", idx));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, MaintenanceRequest>(&sql);
        if let Some(status) = status {
            query = query.bind(status);
        }
        if let Some(priority) = priority {
            query = query.bind(priority);
        }
        if let Some(item_id) = item_id {
            query = query.bind(item_id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Move an open request to in_progress with an assignee.
    /// Returns the updated row and the status it held before.
    pub async fn assign(
        &self,
        id: i32,
        assigned_to: i32,
    ) -> AppResult<(MaintenanceRequest, MaintenanceStatus)> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "SELECT * FROM maintenance_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance request {} not found", id)))?;

        if !request.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Can only assign pending or in-progress maintenance requests. Current status: {}",
                request.status
            )));
        }

        let old_status = request.status;

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "UPDATE maintenance_requests SET status = 'in_progress', assigned_to = $1 WHERE id = $2 RETURNING *",
        )
        .bind(assigned_to)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((request, old_status))
    }

    /// Complete an in-progress request with resolution details
    pub async fn complete(
        &self,
        id: i32,
        resolution_notes: Option<String>,
        cost: Option<rust_decimal::Decimal>,
    ) -> AppResult<MaintenanceRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "SELECT * FROM maintenance_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance request {} not found", id)))?;

        if request.status != MaintenanceStatus::InProgress {
            return Err(AppError::InvalidState(format!(
                "Can only complete in-progress maintenance requests. Current status: {}",
                request.status
            )));
        }

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "UPDATE maintenance_requests SET status = 'completed', resolution_notes = $1, cost = $2 WHERE id = $3 RETURNING *",
        )
        .bind(&resolution_notes)
        .bind(cost)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(request)
    }

    /// Cancel an open request
    pub async fn cancel(&self, id: i32) -> AppResult<MaintenanceRequest> {
        let mut tx = self.pool.begin().await?;

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "SELECT * FROM maintenance_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Maintenance request {} not found", id)))?;

        if !request.status.is_open() {
            return Err(AppError::InvalidState(format!(
                "Can only cancel pending or in-progress maintenance requests. Current status: {}",
                request.status
            )));
        }

        let request = sqlx::query_as::<_, MaintenanceRequest>(
            "UPDATE maintenance_requests SET status = 'cancelled' WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(request)
    }

    /// Persist SLA bookkeeping fields computed in the domain model.
    /// The breach columns are guarded in SQL: the flag is one-way and the
    /// first recorded reason wins even when the sweep wrote it between our
    /// read and this write.
    pub async fn save_sla(&self, request: &MaintenanceRequest) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET sla_hours = $1, sla_due_date = $2, resolution_target = $3,
                first_response_at = $4, resolved_at = $5,
                sla_breached = sla_breached OR $6,
                sla_breach_reason = COALESCE(sla_breach_reason, $7)
            WHERE id = $8
            "#,
        )
        .bind(request.sla_hours)
        .bind(request.sla_due_date)
        .bind(request.resolution_target)
        .bind(request.first_response_at)
        .bind(request.resolved_at)
        .bind(request.sla_breached)
        .bind(&request.sla_breach_reason)
        .bind(request.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Breach all non-breached pending requests whose first-response
    /// deadline passed. Selection and update are one guarded statement so
    /// re-runs are no-ops. Returns the breached IDs.
    pub async fn breach_overdue_pending(
        &self,
        now: DateTime<Utc>,
        reason: &str,
    ) -> AppResult<Vec<i32>> {
        let rows = sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET sla_breached = TRUE, sla_breach_reason = $2
            WHERE status = 'pending'
              AND sla_breached = FALSE
              AND sla_due_date IS NOT NULL
              AND sla_due_date < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .bind(reason)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Breach all non-breached in-progress requests whose resolution
    /// target passed. Returns the breached IDs.
    pub async fn breach_overdue_in_progress(
        &self,
        now: DateTime<Utc>,
        reason: &str,
    ) -> AppResult<Vec<i32>> {
        let rows = sqlx::query(
            r#"
            UPDATE maintenance_requests
            SET sla_breached = TRUE, sla_breach_reason = $2
            WHERE status = 'in_progress'
              AND sla_breached = FALSE
              AND resolution_target IS NOT NULL
              AND resolution_target < $1
            RETURNING id
            "#,
        )
        .bind(now)
        .bind(reason)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|row| row.get("id")).collect())
    }

    /// Workload overview across all maintenance requests
    pub async fn overview(&self) -> AppResult<MaintenanceStatistics> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE status = 'in_progress') AS in_progress,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (WHERE priority = 'urgent' AND status IN ('pending', 'in_progress')) AS urgent_open,
                COUNT(*) FILTER (WHERE sla_breached = TRUE) AS breached,
                COALESCE(SUM(cost) FILTER (WHERE status = 'completed'), 0) AS total_cost
            FROM maintenance_requests
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(MaintenanceStatistics {
            total_requests: row.get("total"),
            pending: row.get("pending"),
            in_progress: row.get("in_progress"),
            completed: row.get("completed"),
            cancelled: row.get("cancelled"),
            urgent_open: row.get("urgent_open"),
            sla_breached: row.get("breached"),
            total_cost: row.get("total_cost"),
        })
    }

    /// Aggregate SLA compliance metrics
    pub async fn statistics(&self, now: DateTime<Utc>) -> AppResult<SlaStatistics> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_requests")
            .fetch_one(&self.pool)
            .await?;

        let breached: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM maintenance_requests WHERE sla_breached = TRUE",
        )
        .fetch_one(&self.pool)
        .await?;

        let at_risk: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM maintenance_requests
            WHERE status = 'pending'
              AND sla_due_date IS NOT NULL
              AND sla_due_date > $1
              AND sla_due_date < $2
            "#,
        )
        .bind(now)
        .bind(now + Duration::hours(2))
        .fetch_one(&self.pool)
        .await?;

        let average_response_hours: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(CAST(AVG(EXTRACT(EPOCH FROM (first_response_at - created_at)) / 3600.0) AS DOUBLE PRECISION), 0)
            FROM maintenance_requests
            WHERE first_response_at IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let average_resolution_hours: f64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(CAST(AVG(EXTRACT(EPOCH FROM (resolved_at - created_at)) / 3600.0) AS DOUBLE PRECISION), 0)
            FROM maintenance_requests
            WHERE resolved_at IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let compliance_rate = if total > 0 {
            round2((total - breached) as f64 / total as f64 * 100.0)
        } else {
            100.0
        };

        Ok(SlaStatistics {
            total_requests: total,
            sla_compliant: total - breached,
            sla_breached: breached,
            at_risk_count: at_risk,
            average_response_hours: round2(average_response_hours),
            average_resolution_hours: round2(average_resolution_hours),
            compliance_rate,
        })
    }
}

/// Round to two decimal places for reporting
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::round2;

    #[test]
    fn statistics_round_to_two_decimals() {
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(100.0), 100.0);
        assert_eq!(round2(0.005), 0.01);
    }
}
