use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::models::{Role, User};

/// Request DTO for user registration
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 100, message = "Full name must be 1-100 characters"))]
    pub full_name: String,

    #[validate(regex(
        path = *crate::shared::validation::PHONE_REGEX,
        message = "Phone must be 8-15 digits with an optional leading +"
    ))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Either `patient` or `psychologist`; administrator accounts are
    /// provisioned out of band.
    pub role: Role,
}

/// Request DTO for user login
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequestDto {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request DTO for changing the current password
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequestDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "New password must be at least 8 characters"))]
    pub new_password: String,
}

/// Response DTO for authentication (register/login)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponseDto {
    /// JWT access token
    pub access_token: String,
    /// Token type (always "Bearer")
    pub token_type: String,
    /// Token expiry time in seconds
    pub expires_in: i64,
    /// Authenticated user info
    pub user: AuthUserDto,
}

/// Account snapshot included in auth responses and `/api/auth/me`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserDto {
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
}

impl From<User> for AuthUserDto {
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
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn register_dto() -> RegisterRequestDto {
        RegisterRequestDto {
            email: SafeEmail().fake(),
            password: "correct-horse-battery".to_string(),
            full_name: Name().fake(),
            phone: Some("+6281234567890".to_string()),
            role: Role::Patient,
        }
    }

    #[test]
    fn test_register_valid() {
        assert!(register_dto().validate().is_ok());
    }

    #[test]
    fn test_register_rejects_bad_input() {
        let mut dto = register_dto();
        dto.email = "not-an-email".to_string();
        assert!(dto.validate().is_err());

        let mut dto = register_dto();
        dto.password = "short".to_string();
        assert!(dto.validate().is_err());

        let mut dto = register_dto();
        dto.phone = Some("12345".to_string());
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_register_wire_format_is_camel_case() {
        let body: RegisterRequestDto = serde_json::from_value(serde_json::json!({
            "email": "sam@example.com",
            "password": "correct-horse-battery",
            "fullName": "Sam Doe",
            "role": "psychologist",
        }))
        .unwrap();
        assert_eq!(body.full_name, "Sam Doe");
        assert_eq!(body.role, Role::Psychologist);
        assert!(body.phone.is_none());
    }
}
