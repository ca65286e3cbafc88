use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;

/// The three account roles. There is no hierarchy between them: an
/// administrator passes a role check only when the check lists
/// `Administrator` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Psychologist,
    Administrator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Psychologist => "psychologist",
            Role::Administrator => "administrator",
        }
    }
}

/// The verified identity attached to a request by the auth middleware.
/// Built fresh from the token on every request and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }
}

/// Why a credential was rejected. All three map to 401; resource-level
/// denials use `Forbidden` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Credential has expired")]
    ExpiredCredential,

    #[error("Account is inactive")]
    AccountInactive,
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        AppError::Unauthorized(failure.to_string())
    }
}

/// Account row. `password_hash` never leaves the service layer.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
