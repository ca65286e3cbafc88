use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::psychologists::models::{PsychologistListing, PsychologistProfile};
use crate::shared::pagination::PageQuery;

/// Request body for creating a practice profile
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileDto {
    #[validate(length(min = 1, max = 2000, message = "Bio must be between 1 and 2000 characters"))]
    pub bio: String,

    #[validate(length(min = 1, max = 10, message = "Provide between 1 and 10 specialties"))]
    pub specialties: Vec<String>,

    #[validate(
        length(min = 6, max = 20, message = "License number must be 6-20 characters"),
        regex(
            path = *crate::shared::validation::LICENSE_REGEX,
            message = "License number may only contain uppercase letters, digits and dashes"
        )
    )]
    pub license_number: String,

    /// Price per session in the platform currency
    pub price_per_session: Decimal,

    #[validate(length(min = 1, max = 500, message = "Address must be between 1 and 500 characters"))]
    pub address: String,
}

/// Request body for updating a practice profile. All fields optional.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, max = 2000, message = "Bio must be between 1 and 2000 characters"))]
    pub bio: Option<String>,

    #[validate(length(min = 1, max = 10, message = "Provide between 1 and 10 specialties"))]
    pub specialties: Option<Vec<String>>,

    pub price_per_session: Option<Decimal>,

    #[validate(length(min = 1, max = 500, message = "Address must be between 1 and 500 characters"))]
    pub address: Option<String>,
}

/// Query parameters for the public psychologist directory
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "snake_case")]
pub struct SearchPsychologistsQuery {
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
    /// Only profiles listing this specialty
    pub specialty: Option<String>,
    /// Latitude of the search origin; requires `lng`
    pub lat: Option<f64>,
    /// Longitude of the search origin; requires `lat`
    pub lng: Option<f64>,
    /// Search radius in kilometers (default 10, max 500)
    pub radius_km: Option<f64>,
}

impl SearchPsychologistsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Public representation of a psychologist profile
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PsychologistProfileDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub bio: String,
    pub specialties: Vec<String>,
    pub license_number: String,
    pub price_per_session: Decimal,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    /// Distance from the search origin, present only on proximity searches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl PsychologistProfileDto {
    pub fn from_profile(profile: PsychologistProfile, full_name: String, avatar_url: Option<String>) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            full_name,
            avatar_url,
            bio: profile.bio,
            specialties: profile.specialties,
            license_number: profile.license_number,
            price_per_session: profile.price_per_session,
            address: profile.address,
            latitude: profile.latitude,
            longitude: profile.longitude,
            is_verified: profile.is_verified,
            rating_avg: profile.rating_avg.to_f64().unwrap_or(0.0),
            rating_count: profile.rating_count,
            created_at: profile.created_at,
            distance_km: None,
        }
    }
}

impl From<PsychologistListing> for PsychologistProfileDto {
    fn from(row: PsychologistListing) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            bio: row.bio,
            specialties: row.specialties,
            license_number: row.license_number,
            price_per_session: row.price_per_session,
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
            is_verified: row.is_verified,
            rating_avg: row.rating_avg.to_f64().unwrap_or(0.0),
            rating_count: row.rating_count,
            created_at: row.created_at,
            distance_km: row.distance_meters.map(|m| m / 1000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_dto(license: &str) -> CreateProfileDto {
        CreateProfileDto {
            bio: "Ten years of CBT practice.".to_string(),
            specialties: vec!["anxiety".to_string()],
            license_number: license.to_string(),
            price_per_session: Decimal::new(30000, 2),
            address: "12 Harley Street, London".to_string(),
        }
    }

    #[test]
    fn test_license_format_enforced() {
        assert!(profile_dto("PSY-2024-0051").validate().is_ok());
        assert!(profile_dto("psy-2024-0051").validate().is_err()); // lowercase
        assert!(profile_dto("PSY-1").validate().is_err()); // under 6 chars
        assert!(profile_dto("PSY-2024-0051-EXTRA-LONG").validate().is_err()); // over 20 chars
    }
}
