//! Business logic services

pub mod notifications;
pub mod sla;
pub mod transactions;

use hourglass_rs::SafeTimeProvider;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub transactions: transactions::TransactionsService,
    pub sla: sla::SlaService,
}

impl Services {
    /// Create all services with the given repository, notifier and clock
    pub fn new(
        repository: Repository,
        lending: &LendingConfig,
        notifier: Arc<dyn notifications::Notifier>,
        time: Arc<SafeTimeProvider>,
    ) -> AppResult<Self> {
        let fee_per_day = Decimal::try_from(lending.fee_per_day)
            .map_err(|e| AppError::Internal(format!("Invalid fee_per_day: {}", e)))?;

        Ok(Self {
            transactions: transactions::TransactionsService::new(
                repository.clone(),
                notifier.clone(),
                time.clone(),
                fee_per_day,
            ),
            sla: sla::SlaService::new(repository.clone(), notifier, time),
            repository,
        })
    }
}
