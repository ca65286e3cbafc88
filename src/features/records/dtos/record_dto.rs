use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::records::models::RecordDetail;
use crate::shared::pagination::PageQuery;

/// Request body for writing a clinical record
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecordDto {
    /// Patient the record concerns
    pub patient_id: Uuid,

    /// Session the record belongs to, if any
    pub appointment_id: Option<Uuid>,

    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Notes must be between 1 and 10000 characters"))]
    pub notes: String,
}

/// Request body for amending a clinical record
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRecordDto {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000, message = "Notes must be between 1 and 10000 characters"))]
    pub notes: Option<String>,
}

/// Query parameters for listing clinical records
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecordsQuery {
    /// Page number (default 1)
    #[serde(
        default = "crate::shared::pagination::default_page",
        deserialize_with = "crate::shared::pagination::lenient_page"
    )]
    pub page: i64,
    /// Items per page (default 10, max 100)
    #[serde(
        default = "crate::shared::pagination::default_limit",
        deserialize_with = "crate::shared::pagination::lenient_limit"
    )]
    pub limit: i64,
}

impl ListRecordsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Clinical record as returned to its three visible parties
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordDto {
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

impl From<RecordDetail> for RecordDto {
    fn from(row: RecordDetail) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            psychologist_id: row.psychologist_id,
            psychologist_name: row.psychologist_name,
            appointment_id: row.appointment_id,
            title: row.title,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
