use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Review joined with the reviewer's name, as listed publicly.
/// `psychologist_id` references the practice profile; one review per
/// appointment.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewDetail {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
