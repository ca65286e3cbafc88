use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::{Role, User};
use crate::features::users::dtos::{UpdateUserDto, UserDto};
use crate::shared::pagination::PageQuery;

/// Service for account profile reads and updates.
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch one account. Callers authorize before this runs, so a missing
    /// row here is a plain 404 and leaks nothing through the guard.
    pub async fn get_user(&self, id: Uuid) -> Result<UserDto> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load user: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    /// Partial profile update; absent fields keep their values.
    pub async fn update_user(&self, id: Uuid, dto: UpdateUserDto) -> Result<UserDto> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                phone = COALESCE($2, phone),
                avatar_url = COALESCE($3, avatar_url),
                updated_at = NOW()
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&dto.full_name)
        .bind(&dto.phone)
        .bind(&dto.avatar_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update user: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }

    /// List accounts, optionally filtered by role. The count and the page
    /// share one predicate so the meta total always matches the data.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        query: &PageQuery,
    ) -> Result<(Vec<UserDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::user_role IS NULL OR role = $1)",
        )
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count users: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
            ORDER BY created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(role)
        .bind(query.offset())
        .bind(query.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list users: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((rows.into_iter().map(UserDto::from).collect(), total))
    }
}
