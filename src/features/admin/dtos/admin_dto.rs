use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::auth::models::Role;
use crate::shared::pagination::PageQuery;

/// Query params for the admin account listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListUsersAdminQuery {
    /// Page number (1-indexed)
    #[serde(
        default = "crate::shared::pagination::default_page",
        deserialize_with = "crate::shared::pagination::lenient_page"
    )]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(
        default = "crate::shared::pagination::default_limit",
        deserialize_with = "crate::shared::pagination::lenient_limit"
    )]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
    /// Filter by role
    pub role: Option<Role>,
    /// Filter by account state (false = banned)
    pub is_active: Option<bool>,
}

impl ListUsersAdminQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query params for the profile moderation queue
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListProfilesAdminQuery {
    /// Page number (1-indexed)
    #[serde(
        default = "crate::shared::pagination::default_page",
        deserialize_with = "crate::shared::pagination::lenient_page"
    )]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(
        default = "crate::shared::pagination::default_limit",
        deserialize_with = "crate::shared::pagination::lenient_limit"
    )]
    #[param(minimum = 1, maximum = 100)]
    pub limit: i64,
    /// Filter by verification state (false = awaiting review)
    pub verified: Option<bool>,
}

impl ListProfilesAdminQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Request to ban or reinstate an account
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusDto {
    /// false bans the account, true reinstates it
    pub is_active: bool,
    /// Reason shared with the affected user
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Account counts broken down by role
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCounts {
    pub total: i64,
    pub patients: i64,
    pub psychologists: i64,
    pub administrators: i64,
    pub banned: i64,
}

/// Appointment counts broken down by status
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCounts {
    pub total: i64,
    pub pending: i64,
    pub confirmed: i64,
    pub completed: i64,
    pub cancelled: i64,
}

/// Settled payment counts and gross revenue
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTotals {
    pub paid: i64,
    pub refunded: i64,
    /// Sum of settled payment amounts
    pub revenue: Decimal,
}

/// Platform-wide counts for the admin overview
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewDto {
    pub users: UserCounts,
    pub appointments: AppointmentCounts,
    pub payments: PaymentTotals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ban_reason_over_limit_is_rejected() {
        let dto = UpdateUserStatusDto {
            is_active: false,
            reason: Some("x".repeat(501)),
        };
        assert!(dto.validate().is_err());

        let dto = UpdateUserStatusDto {
            is_active: false,
            reason: Some("x".repeat(500)),
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn overview_serializes_camel_case() {
        let overview = OverviewDto {
            users: UserCounts {
                total: 10,
                patients: 7,
                psychologists: 2,
                administrators: 1,
                banned: 0,
            },
            appointments: AppointmentCounts {
                total: 4,
                pending: 1,
                confirmed: 1,
                completed: 2,
                cancelled: 0,
            },
            payments: PaymentTotals {
                paid: 2,
                refunded: 0,
                revenue: Decimal::new(30000, 2),
            },
        };

        let value = serde_json::to_value(&overview).unwrap();
        assert_eq!(value["users"]["patients"], 7);
        assert_eq!(value["appointments"]["completed"], 2);
        assert_eq!(value["payments"]["revenue"], "300.00");
    }
}
