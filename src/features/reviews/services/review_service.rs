use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::appointments::models::AppointmentStatus;
use crate::features::auth::guards::authorize_ownership;
use crate::features::auth::models::Principal;
use crate::features::reviews::dtos::{CreateReviewDto, ReviewDto};
use crate::features::reviews::models::ReviewDetail;
use crate::shared::pagination::PageQuery;

pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Review a completed appointment. Only the patient who attended
    /// may review, once per appointment; the profile's rating
    /// aggregates follow every change.
    pub async fn create_review(
        &self,
        principal: &Principal,
        dto: CreateReviewDto,
    ) -> Result<ReviewDto> {
        let appointment = sqlx::query_as::<_, (Uuid, Uuid, AppointmentStatus)>(
            "SELECT patient_id, psychologist_id, status FROM appointments WHERE id = $1",
        )
        .bind(dto.appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load appointment for review: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
        let (patient_id, psychologist_id, status) = appointment;

        authorize_ownership(Some(principal), patient_id)?;

        if status != AppointmentStatus::Completed {
            return Err(AppError::Conflict(
                "Only completed appointments can be reviewed".to_string(),
            ));
        }

        let review_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO reviews (appointment_id, patient_id, psychologist_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(dto.appointment_id)
        .bind(patient_id)
        .bind(psychologist_id)
        .bind(dto.rating)
        .bind(&dto.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                "This appointment has already been reviewed".to_string(),
            ),
            _ => {
                tracing::error!("Failed to create review: {:?}", e);
                AppError::Database(e)
            }
        })?;

        self.recompute_rating(psychologist_id).await?;

        tracing::info!(
            "Review {} created for appointment {}",
            review_id,
            dto.appointment_id
        );

        let detail = self.require_detail(review_id).await?;
        Ok(detail.into())
    }

    /// Public reviews of a verified psychologist, newest first.
    pub async fn list_for_psychologist(
        &self,
        psychologist_id: Uuid,
        page: &PageQuery,
    ) -> Result<(Vec<ReviewDto>, i64)> {
        let visible = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM psychologist_profiles p
                JOIN users u ON u.id = p.user_id
                WHERE p.id = $1 AND p.is_verified = TRUE AND u.is_active = TRUE
            )
            "#,
        )
        .bind(psychologist_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check profile visibility: {:?}", e);
            AppError::Database(e)
        })?;

        if !visible {
            return Err(AppError::NotFound(
                "Psychologist profile not found".to_string(),
            ));
        }

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reviews WHERE psychologist_id = $1",
        )
        .bind(psychologist_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count reviews: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, ReviewDetail>(
            r#"
            SELECT r.id, r.appointment_id, r.patient_id, pat.full_name AS patient_name,
                   r.psychologist_id, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users pat ON pat.id = r.patient_id
            WHERE r.psychologist_id = $1
            ORDER BY r.created_at DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(psychologist_id)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list reviews: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Remove a review (moderation) and refresh the profile's rating.
    pub async fn delete_review(&self, id: Uuid) -> Result<()> {
        let psychologist_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM reviews WHERE id = $1 RETURNING psychologist_id",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete review: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))?;

        self.recompute_rating(psychologist_id).await?;

        tracing::info!("Review {} deleted", id);
        Ok(())
    }

    /// Rating aggregates live on the profile row so directory searches
    /// never touch the reviews table.
    async fn recompute_rating(&self, psychologist_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE psychologist_profiles
            SET rating_avg = COALESCE(
                    (SELECT ROUND(AVG(rating)::numeric, 2) FROM reviews WHERE psychologist_id = $1),
                    0
                ),
                rating_count = (SELECT COUNT(*) FROM reviews WHERE psychologist_id = $1),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(psychologist_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to recompute rating aggregates: {:?}", e);
            AppError::Database(e)
        })?;
        Ok(())
    }

    async fn require_detail(&self, id: Uuid) -> Result<ReviewDetail> {
        sqlx::query_as::<_, ReviewDetail>(
            r#"
            SELECT r.id, r.appointment_id, r.patient_id, pat.full_name AS patient_name,
                   r.psychologist_id, r.rating, r.comment, r.created_at
            FROM reviews r
            JOIN users pat ON pat.id = r.patient_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch review: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Review not found".to_string()))
    }
}
