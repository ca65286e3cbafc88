use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, AuthUserDto, ChangePasswordRequestDto, LoginRequestDto, RegisterRequestDto,
};
use crate::features::auth::models::{AuthFailure, Principal, Role, User};
use crate::features::auth::services::token_service::TokenService;

/// Service for account registration, login, and password management.
pub struct AuthService {
    pool: PgPool,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: Arc<TokenService>) -> Self {
        Self { pool, tokens }
    }

    /// Register a new patient or psychologist account.
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        if dto.role == Role::Administrator {
            return Err(AppError::Validation(
                "Administrator accounts cannot be self-registered".to_string(),
            ));
        }

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&dto.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check email uniqueness: {:?}", e);
            AppError::Database(e)
        })?;

        if existing.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        let password_hash = hash_password(&dto.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name, phone, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&dto.email)
        .bind(&password_hash)
        .bind(&dto.full_name)
        .bind(&dto.phone)
        .bind(dto.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Registered new account");

        let issued = self.tokens.issue(user.id, user.role)?;

        Ok(AuthResponseDto {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }

    /// Login with email and password.
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(&dto.email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load user for login: {:?}", e);
            AppError::Database(e)
        })?
        // Unknown emails and wrong passwords get the same answer.
        .ok_or(AuthFailure::InvalidCredential)?;

        if !verify_password(&dto.password, &user.password_hash)? {
            return Err(AuthFailure::InvalidCredential.into());
        }

        if !user.is_active {
            return Err(AuthFailure::AccountInactive.into());
        }

        let issued = self.tokens.issue(user.id, user.role)?;

        Ok(AuthResponseDto {
            access_token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: user.into(),
        })
    }

    /// Current account snapshot for `/api/auth/me`.
    pub async fn get_current_user(&self, principal: &Principal) -> Result<AuthUserDto> {
        let user = self.load_user(principal.id).await?;
        Ok(user.into())
    }

    /// Change the current user's password after verifying the old one.
    pub async fn change_password(
        &self,
        principal: &Principal,
        dto: ChangePasswordRequestDto,
    ) -> Result<()> {
        let user = self.load_user(principal.id).await?;

        if !verify_password(&dto.current_password, &user.password_hash)? {
            return Err(AuthFailure::InvalidCredential.into());
        }

        let password_hash = hash_password(&dto.new_password)?;

        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update password: {:?}", e);
                AppError::Database(e)
            })?;

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Create the first administrator account when none exists yet.
    /// Called once at startup when bootstrap credentials are configured.
    pub async fn bootstrap_admin(&self, email: &str, password: &str) -> Result<()> {
        let admin_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE role = 'administrator')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check for administrator accounts: {:?}", e);
            AppError::Database(e)
        })?;

        if admin_exists {
            return Ok(());
        }

        let password_hash = hash_password(password)?;

        sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, full_name, role)
            VALUES ($1, $2, 'Administrator', 'administrator')
            "#,
        )
        .bind(email)
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create bootstrap administrator: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(email, "Bootstrap administrator created");
        Ok(())
    }

    async fn load_user(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load user: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_stored_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }
}
