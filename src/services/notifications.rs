//! Notification collaborator
//!
//! Delivery is best-effort and fire-and-forget relative to state changes:
//! engines commit first, then attempt delivery, and a failure is logged
//! and counted but never rolls back or aborts the triggering operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox, Message, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{enums::MaintenancePriority, user::User},
};

/// Lifecycle event to deliver to a user
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Checkout {
        item_name: String,
        due_date: DateTime<Utc>,
    },
    Return {
        item_name: String,
        late: bool,
        late_fee: Decimal,
    },
    Overdue {
        item_name: String,
        due_date: DateTime<Utc>,
        days_overdue: i64,
    },
    MaintenanceAssigned {
        item_name: String,
        priority: MaintenancePriority,
    },
    MaintenanceCompleted {
        item_name: String,
    },
}

impl NotificationEvent {
    /// Machine-readable event type
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationEvent::Checkout { .. } => "checkout",
            NotificationEvent::Return { late: false, .. } => "return_ontime",
            NotificationEvent::Return { late: true, .. } => "return_late",
            NotificationEvent::Overdue { .. } => "overdue",
            NotificationEvent::MaintenanceAssigned { .. } => "maintenance_assigned",
            NotificationEvent::MaintenanceCompleted { .. } => "maintenance_completed",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            NotificationEvent::Checkout { item_name, .. } => {
                format!("Checkout confirmation: {}", item_name)
            }
            NotificationEvent::Return { item_name, .. } => {
                format!("Return confirmation: {}", item_name)
            }
            NotificationEvent::Overdue { item_name, .. } => {
                format!("Overdue item: {}", item_name)
            }
            NotificationEvent::MaintenanceAssigned { item_name, .. } => {
                format!("Maintenance assigned: {}", item_name)
            }
            NotificationEvent::MaintenanceCompleted { item_name } => {
                format!("Maintenance completed: {}", item_name)
            }
        }
    }

    pub fn body(&self) -> String {
        match self {
            NotificationEvent::Checkout { item_name, due_date } => format!(
                "You have checked out \"{}\".\n\nPlease return it by {}.",
                item_name,
                due_date.format("%Y-%m-%d %H:%M UTC")
            ),
            NotificationEvent::Return {
                item_name,
                late: false,
                ..
            } => format!("Thank you for returning \"{}\" on time.", item_name),
            NotificationEvent::Return {
                item_name,
                late: true,
                late_fee,
            } => format!(
                "\"{}\" was returned late. A late fee of {:.2} has been applied to your account.",
                item_name, late_fee
            ),
            NotificationEvent::Overdue {
                item_name,
                due_date,
                days_overdue,
            } => format!(
                "\"{}\" was due on {} and is now {} day(s) overdue.\n\nPlease return it as soon as possible to avoid further late fees.",
                item_name,
                due_date.format("%Y-%m-%d %H:%M UTC"),
                days_overdue
            ),
            NotificationEvent::MaintenanceAssigned { item_name, priority } => format!(
                "A maintenance request for \"{}\" (priority: {}) has been assigned to you.",
                item_name, priority
            ),
            NotificationEvent::MaintenanceCompleted { item_name } => {
                format!("Maintenance work on \"{}\" has been completed.", item_name)
            }
        }
    }
}

/// Boundary contract for delivering lifecycle events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: &User, event: NotificationEvent) -> AppResult<()>;
}

/// Attempt delivery, swallowing and logging any failure.
/// Returns whether the notification went out.
pub async fn try_notify(notifier: &dyn Notifier, user: &User, event: NotificationEvent) -> bool {
    let kind = event.kind();
    match notifier.notify(user, event).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(
                user_id = user.id,
                event = kind,
                "Failed to deliver notification: {}",
                e
            );
            false
        }
    }
}

/// SMTP-backed notifier
#[derive(Clone)]
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> AppResult<Message> {
        let from_name = self
            .config
            .smtp_from_name
            .as_deref()
            .unwrap_or("Inventra");
        let from_mailbox = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Notification(format!("Invalid from address: {}", e)))?;

        let to_mailbox = Mailbox::from_str(to)
            .map_err(|e| AppError::Notification(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(format!(
                                r#"<html><body><pre>{}</pre></body></html>"#,
                                body.replace('\n', "<br>")
                            )),
                    ),
            )
            .map_err(|e| AppError::Notification(format!("Failed to build email: {}", e)))
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let mut builder = if self.config.smtp_use_tls {
            SmtpTransport::relay(&self.config.smtp_host)
                .map_err(|e| AppError::Notification(format!("Invalid SMTP relay: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        };
        builder = builder.port(self.config.smtp_port);

        if let (Some(username), Some(password)) =
            (&self.config.smtp_username, &self.config.smtp_password)
        {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, user: &User, event: NotificationEvent) -> AppResult<()> {
        let message = self.build_message(&user.email, &event.subject(), &event.body())?;
        let transport = self.transport()?;

        transport
            .send(&message)
            .map_err(|e| AppError::Notification(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn user() -> User {
        User {
            id: 7,
            name: "Avery Quinn".to_string(),
            email: "avery@example.org".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn event_kinds_distinguish_late_and_ontime_returns() {
        let ontime = NotificationEvent::Return {
            item_name: "Camera".to_string(),
            late: false,
            late_fee: Decimal::ZERO,
        };
        let late = NotificationEvent::Return {
            item_name: "Camera".to_string(),
            late: true,
            late_fee: dec!(4.00),
        };
        assert_eq!(ontime.kind(), "return_ontime");
        assert_eq!(late.kind(), "return_late");
        assert!(late.body().contains("4.00"));
    }

    #[tokio::test]
    async fn try_notify_swallows_delivery_failure() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .returning(|_, _| Err(AppError::Notification("smtp down".to_string())));

        let sent = try_notify(
            &notifier,
            &user(),
            NotificationEvent::Overdue {
                item_name: "Projector".to_string(),
                due_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                days_overdue: 3,
            },
        )
        .await;

        assert!(!sent);
    }

    #[tokio::test]
    async fn try_notify_reports_success() {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_, _| Ok(()));

        let sent = try_notify(
            &notifier,
            &user(),
            NotificationEvent::Checkout {
                item_name: "Laptop".to_string(),
                due_date: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            },
        )
        .await;

        assert!(sent);
    }
}
