use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::admin::dtos::{
    AppointmentCounts, OverviewDto, PaymentTotals, UpdateUserStatusDto, UserCounts,
};
use crate::features::auth::models::{Principal, Role, User};
use crate::features::notifications::services::MailerService;
use crate::features::psychologists::dtos::PsychologistProfileDto;
use crate::features::psychologists::models::{PsychologistListing, PsychologistProfile};
use crate::features::users::dtos::UserDto;
use crate::shared::pagination::PageQuery;

/// Service for marketplace moderation: account bans, profile
/// verification and platform statistics.
pub struct AdminService {
    pool: PgPool,
    mailer: Arc<MailerService>,
}

impl AdminService {
    pub fn new(pool: PgPool, mailer: Arc<MailerService>) -> Self {
        Self { pool, mailer }
    }

    /// List accounts with optional role and activity filters. The count
    /// and the page share one predicate so the meta total always matches
    /// the data.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        is_active: Option<bool>,
        query: &PageQuery,
    ) -> Result<(Vec<UserDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            "#,
        )
        .bind(role)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count users: {:?}", e);
            AppError::Database(e)
        })?;

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::user_role IS NULL OR role = $1)
              AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(role)
        .bind(is_active)
        .bind(query.offset())
        .bind(query.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch users: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((users.into_iter().map(UserDto::from).collect(), total))
    }

    /// Ban or reinstate an account. The claim resolver re-reads
    /// `is_active` on every request, so a ban takes effect on the
    /// target's next call even while their token is still unexpired.
    pub async fn set_user_status(
        &self,
        actor: &Principal,
        id: Uuid,
        dto: UpdateUserStatusDto,
    ) -> Result<UserDto> {
        if actor.id == id && !dto.is_active {
            return Err(AppError::Forbidden(
                "Administrators cannot ban their own account".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(dto.is_active)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update account status: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        tracing::info!(
            user_id = %user.id,
            is_active = user.is_active,
            "Account status changed"
        );

        let (subject, body) = if user.is_active {
            (
                "Your account has been reinstated",
                "Your account is active again. You can sign in as usual.".to_string(),
            )
        } else {
            let reason = dto.reason.as_deref().unwrap_or("No reason given");
            (
                "Your account has been suspended",
                format!(
                    "Your account has been suspended. Reason: {}. Contact support if you believe this is a mistake.",
                    reason
                ),
            )
        };
        self.mailer
            .send_detached(user.email.clone(), subject.to_string(), body);

        Ok(user.into())
    }

    /// List psychologist profiles for the moderation queue, optionally
    /// filtered by verification state.
    pub async fn list_profiles(
        &self,
        verified: Option<bool>,
        query: &PageQuery,
    ) -> Result<(Vec<PsychologistProfileDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM psychologist_profiles WHERE ($1::boolean IS NULL OR is_verified = $1)",
        )
        .bind(verified)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count profiles: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, PsychologistListing>(
            r#"
            SELECT p.*, u.full_name, u.avatar_url, NULL::float8 AS distance_meters
            FROM psychologist_profiles p
            JOIN users u ON u.id = p.user_id
            WHERE ($1::boolean IS NULL OR p.is_verified = $1)
            ORDER BY p.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(verified)
        .bind(query.offset())
        .bind(query.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch profiles: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((
            rows.into_iter().map(PsychologistProfileDto::from).collect(),
            total,
        ))
    }

    /// Mark a profile verified and notify the psychologist. Verifying an
    /// already-verified profile is a no-op and sends no second email.
    pub async fn verify_profile(&self, id: Uuid) -> Result<PsychologistProfileDto> {
        let updated = sqlx::query_as::<_, PsychologistProfile>(
            r#"
            UPDATE psychologist_profiles
            SET is_verified = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_verified = FALSE
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify profile: {:?}", e);
            AppError::Database(e)
        })?;

        let (profile, newly_verified) = match updated {
            Some(profile) => (profile, true),
            None => {
                let profile = sqlx::query_as::<_, PsychologistProfile>(
                    "SELECT * FROM psychologist_profiles WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to load profile: {:?}", e);
                    AppError::Database(e)
                })?
                .ok_or_else(|| AppError::NotFound("Psychologist profile not found".to_string()))?;
                (profile, false)
            }
        };

        let (email, full_name, avatar_url) = sqlx::query_as::<_, (String, String, Option<String>)>(
            "SELECT email, full_name, avatar_url FROM users WHERE id = $1",
        )
        .bind(profile.user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load profile owner: {:?}", e);
            AppError::Database(e)
        })?;

        if newly_verified {
            tracing::info!(profile_id = %profile.id, "Psychologist profile verified");
            self.mailer.send_detached(
                email,
                "Your profile has been verified".to_string(),
                "Your psychologist profile passed review and is now visible in patient searches."
                    .to_string(),
            );
        }

        Ok(PsychologistProfileDto::from_profile(
            profile, full_name, avatar_url,
        ))
    }

    /// Platform-wide counts for the admin dashboard.
    pub async fn overview(&self) -> Result<OverviewDto> {
        let (total, patients, psychologists, administrators, banned) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE role = 'patient'),
                    COUNT(*) FILTER (WHERE role = 'psychologist'),
                    COUNT(*) FILTER (WHERE role = 'administrator'),
                    COUNT(*) FILTER (WHERE NOT is_active)
                FROM users
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user counts: {:?}", e);
                AppError::Database(e)
            })?;

        let (appt_total, pending, confirmed, completed, cancelled) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'pending'),
                    COUNT(*) FILTER (WHERE status = 'confirmed'),
                    COUNT(*) FILTER (WHERE status = 'completed'),
                    COUNT(*) FILTER (WHERE status = 'cancelled')
                FROM appointments
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get appointment counts: {:?}", e);
                AppError::Database(e)
            })?;

        let (paid, refunded, revenue) = sqlx::query_as::<_, (i64, i64, Decimal)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'paid'),
                COUNT(*) FILTER (WHERE status = 'refunded'),
                COALESCE(SUM(amount) FILTER (WHERE status = 'paid'), 0)
            FROM payments
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get payment totals: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(OverviewDto {
            users: UserCounts {
                total,
                patients,
                psychologists,
                administrators,
                banned,
            },
            appointments: AppointmentCounts {
                total: appt_total,
                pending,
                confirmed,
                completed,
                cancelled,
            },
            payments: PaymentTotals {
                paid,
                refunded,
                revenue,
            },
        })
    }
}
