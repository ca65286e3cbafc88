use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::appointments::models::{AppointmentDetail, AppointmentStatus};
use crate::shared::pagination::PageQuery;

/// Request body for booking an appointment
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentDto {
    /// Practice profile of the psychologist to book
    pub psychologist_id: Uuid,

    /// Requested session start, must be in the future
    pub scheduled_at: DateTime<Utc>,

    /// Session length in minutes (default 60)
    #[validate(range(min = 30, max = 240, message = "Duration must be between 30 and 240 minutes"))]
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

/// Request body for moving an appointment through its lifecycle
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentStatusDto {
    pub status: AppointmentStatus,

    /// Only meaningful when cancelling
    #[validate(length(max = 500, message = "Cancellation reason must be at most 500 characters"))]
    pub cancellation_reason: Option<String>,
}

/// Query parameters for listing appointments
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAppointmentsQuery {
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
    /// Filter by lifecycle status
    pub status: Option<AppointmentStatus>,
}

impl ListAppointmentsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Appointment as returned to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDto {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
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

impl From<AppointmentDetail> for AppointmentDto {
    fn from(row: AppointmentDetail) -> Self {
        Self {
            id: row.id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            psychologist_id: row.psychologist_id,
            psychologist_name: row.psychologist_name,
            scheduled_at: row.scheduled_at,
            duration_minutes: row.duration_minutes,
            price: row.price,
            status: row.status,
            notes: row.notes,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
