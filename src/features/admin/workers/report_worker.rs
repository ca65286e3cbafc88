use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tokio::time::interval;

use crate::core::error::{AppError, Result};
use crate::features::notifications::services::MailerService;

/// Delay between summary emails
const REPORT_INTERVAL_SECS: u64 = 60 * 60 * 24;

/// Background worker that mails a daily activity summary to the
/// platform administrator address.
pub struct ReportWorker {
    pool: PgPool,
    mailer: Arc<MailerService>,
}

impl ReportWorker {
    pub fn new(pool: PgPool, mailer: Arc<MailerService>) -> Self {
        Self { pool, mailer }
    }

    /// Run the worker in a background loop
    pub async fn run(&self) {
        tracing::info!("Starting daily report worker");

        let mut interval = interval(Duration::from_secs(REPORT_INTERVAL_SECS));
        // The first tick completes immediately; consume it so the first
        // summary goes out a full period after startup, not on boot.
        interval.tick().await;

        loop {
            interval.tick().await;

            if let Err(e) = self.send_daily_summary().await {
                tracing::error!("Error sending daily summary: {:?}", e);
            }
        }
    }

    async fn send_daily_summary(&self) -> Result<()> {
        let (new_users, new_appointments, settled_payments, revenue) =
            sqlx::query_as::<_, (i64, i64, i64, Decimal)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM users
                     WHERE created_at >= NOW() - INTERVAL '24 hours'),
                    (SELECT COUNT(*) FROM appointments
                     WHERE created_at >= NOW() - INTERVAL '24 hours'),
                    (SELECT COUNT(*) FROM payments
                     WHERE status = 'paid' AND paid_at >= NOW() - INTERVAL '24 hours'),
                    (SELECT COALESCE(SUM(amount), 0) FROM payments
                     WHERE status = 'paid' AND paid_at >= NOW() - INTERVAL '24 hours')
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to collect daily counts: {:?}", e);
                AppError::Database(e)
            })?;

        let body = format!(
            "Activity for the last 24 hours:\n\n\
             New registrations: {}\n\
             New appointments: {}\n\
             Settled payments: {} (sum {})",
            new_users, new_appointments, settled_payments, revenue
        );

        self.mailer
            .send(self.mailer.admin_address(), "Daily platform summary", &body)
            .await?;

        tracing::info!(
            new_users,
            new_appointments,
            settled_payments,
            "Daily summary sent"
        );

        Ok(())
    }
}
