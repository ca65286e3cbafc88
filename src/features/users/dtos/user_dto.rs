use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::models::{Role, User};
use crate::shared::pagination::PageQuery;

/// Public representation of an account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            phone: user.phone,
            avatar_url: user.avatar_url,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Query params for the account listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListUsersQuery {
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
}

impl ListUsersQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Request DTO for updating a profile. Absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    #[validate(regex(
        path = *crate::shared::validation::PHONE_REGEX,
        message = "Phone must be 8-15 digits with an optional leading +"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}
