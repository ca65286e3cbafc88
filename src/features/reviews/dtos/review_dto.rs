use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::reviews::models::ReviewDetail;
use crate::shared::pagination::PageQuery;

/// Request body for reviewing a completed appointment
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewDto {
    /// Completed appointment being reviewed
    pub appointment_id: Uuid,

    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i16,

    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters"))]
    pub comment: Option<String>,
}

/// Query parameters for listing a psychologist's reviews
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReviewsQuery {
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

impl ListReviewsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Review as returned to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDto {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub patient_name: String,
    pub psychologist_id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewDetail> for ReviewDto {
    fn from(row: ReviewDetail) -> Self {
        Self {
            id: row.id,
            appointment_id: row.appointment_id,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            psychologist_id: row.psychologist_id,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i16) -> CreateReviewDto {
        CreateReviewDto {
            appointment_id: Uuid::new_v4(),
            rating,
            comment: None,
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
        assert!(review(1).validate().is_ok());
        assert!(review(5).validate().is_ok());
    }
}
