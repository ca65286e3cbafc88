use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for an uploaded image
#[derive(Debug, Clone, FromRow)]
pub struct StoredFile {
    pub id: Uuid,
    pub uploader_id: Uuid,
    pub object_key: String,
    pub public_url: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}
