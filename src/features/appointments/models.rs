use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle of an appointment.
///
/// ```text
/// pending -> confirmed -> completed
///    \           \
///     +-----------+--> cancelled
/// ```
///
/// `completed` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }

    /// Whether moving from `self` to `next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Completed)
        )
    }
}

/// Appointment joined with both participants, as listed and returned
/// to clients. `psychologist_id` references the practice profile, not
/// the user account.
#[derive(Debug, Clone, FromRow)]
pub struct AppointmentDetail {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
    pub psychologist_user_id: Uuid,
    pub psychologist_name: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::AppointmentStatus::*;

    #[test]
    fn test_legal_transitions() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for next in [Pending, Confirmed, Cancelled, Completed] {
            assert!(!Cancelled.can_transition_to(next));
            assert!(!Completed.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_skipping_confirmation() {
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn test_no_self_transitions() {
        for status in [Pending, Confirmed, Cancelled, Completed] {
            assert!(!status.can_transition_to(status));
        }
    }
}
