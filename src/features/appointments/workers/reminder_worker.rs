use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tokio::time::interval;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::services::MailerService;
use crate::shared::constants::REMINDER_WINDOW_HOURS;

/// Delay between reminder sweeps
const SWEEP_INTERVAL_SECS: u64 = 300;

/// Upper bound on reminders handled per sweep
const BATCH_SIZE: i64 = 100;

#[derive(Debug, FromRow)]
struct DueReminder {
    id: Uuid,
    scheduled_at: DateTime<Utc>,
    patient_email: String,
    patient_name: String,
    psychologist_name: String,
}

/// Background worker that reminds patients of upcoming confirmed
/// sessions. Each appointment is reminded at most once; a failed send
/// leaves the row unmarked so the next sweep retries it.
pub struct ReminderWorker {
    pool: PgPool,
    mailer: Arc<MailerService>,
}

impl ReminderWorker {
    pub fn new(pool: PgPool, mailer: Arc<MailerService>) -> Self {
        Self { pool, mailer }
    }

    /// Run the worker in a background loop
    pub async fn run(&self) {
        tracing::info!("Starting appointment reminder worker");

        let mut interval = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));

        loop {
            interval.tick().await;

            if let Err(e) = self.process_due_reminders().await {
                tracing::error!("Error processing appointment reminders: {:?}", e);
            }
        }
    }

    async fn process_due_reminders(&self) -> Result<()> {
        let due = sqlx::query_as::<_, DueReminder>(
            r#"
            SELECT a.id, a.scheduled_at, pat.email AS patient_email,
                   pat.full_name AS patient_name, doc.full_name AS psychologist_name
            FROM appointments a
            JOIN users pat ON pat.id = a.patient_id
            JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
            JOIN users doc ON doc.id = prof.user_id
            WHERE a.status = 'confirmed'
              AND a.reminder_sent_at IS NULL
              AND a.scheduled_at > NOW()
              AND a.scheduled_at <= NOW() + make_interval(hours => $1)
            ORDER BY a.scheduled_at
            LIMIT $2
            "#,
        )
        .bind(REMINDER_WINDOW_HOURS)
        .bind(BATCH_SIZE)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch due reminders: {:?}", e);
            AppError::Database(e)
        })?;

        if due.is_empty() {
            return Ok(());
        }

        tracing::info!("Sending {} appointment reminders", due.len());

        for reminder in due {
            let body = format!(
                "Hi {}, this is a reminder of your session with {} on {}.",
                reminder.patient_name,
                reminder.psychologist_name,
                reminder.scheduled_at.format("%Y-%m-%d %H:%M UTC")
            );

            // Send synchronously so only delivered reminders get marked.
            if let Err(e) = self
                .mailer
                .send(&reminder.patient_email, "Appointment reminder", &body)
                .await
            {
                tracing::warn!(
                    "Reminder for appointment {} failed, will retry next sweep: {:?}",
                    reminder.id,
                    e
                );
                continue;
            }

            self.mark_sent(reminder.id).await?;
        }

        Ok(())
    }

    async fn mark_sent(&self, appointment_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE appointments SET reminder_sent_at = NOW() \
             WHERE id = $1 AND reminder_sent_at IS NULL",
        )
        .bind(appointment_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to mark reminder sent: {:?}", e);
            AppError::Database(e)
        })?;
        Ok(())
    }
}
