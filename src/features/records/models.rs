use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for a clinical record. Visible to exactly three
/// parties: the authoring psychologist, the patient it concerns, and
/// administrators. `psychologist_id` is the author's user account.
#[derive(Debug, Clone, FromRow)]
pub struct ClinicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub psychologist_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Record joined with both parties' names
#[derive(Debug, Clone, FromRow)]
pub struct RecordDetail {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
    pub psychologist_name: String,
    pub appointment_id: Option<Uuid>,
    pub title: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
