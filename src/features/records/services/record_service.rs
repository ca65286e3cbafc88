use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::authorize_ownership;
use crate::features::auth::models::{Principal, Role};
use crate::features::records::dtos::{CreateRecordDto, RecordDto, UpdateRecordDto};
use crate::features::records::models::{ClinicalRecord, RecordDetail};
use crate::shared::pagination::PageQuery;

const DETAIL_SELECT: &str = r#"
    SELECT r.id, r.patient_id, pat.full_name AS patient_name,
           r.psychologist_id, doc.full_name AS psychologist_name,
           r.appointment_id, r.title, r.notes, r.created_at, r.updated_at
    FROM clinical_records r
    JOIN users pat ON pat.id = r.patient_id
    JOIN users doc ON doc.id = r.psychologist_id"#;

pub struct RecordService {
    pool: PgPool,
}

impl RecordService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Write a clinical record. The author must actually treat the
    /// patient: at least one appointment between the two that was not
    /// cancelled.
    pub async fn create_record(
        &self,
        principal: &Principal,
        dto: CreateRecordDto,
    ) -> Result<RecordDto> {
        let treats_patient = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM appointments a
                JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
                WHERE prof.user_id = $1
                  AND a.patient_id = $2
                  AND a.status <> 'cancelled'
            )
            "#,
        )
        .bind(principal.id)
        .bind(dto.patient_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check therapeutic relationship: {:?}", e);
            AppError::Database(e)
        })?;

        if !treats_patient {
            return Err(AppError::Forbidden(
                "No therapeutic relationship with this patient".to_string(),
            ));
        }

        if let Some(appointment_id) = dto.appointment_id {
            let matches = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS(
                    SELECT 1 FROM appointments a
                    JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
                    WHERE a.id = $1
                      AND prof.user_id = $2
                      AND a.patient_id = $3
                      AND a.status <> 'cancelled'
                )
                "#,
            )
            .bind(appointment_id)
            .bind(principal.id)
            .bind(dto.patient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to check record appointment: {:?}", e);
                AppError::Database(e)
            })?;

            if !matches {
                return Err(AppError::BadRequest(
                    "Appointment does not match this patient".to_string(),
                ));
            }
        }

        let record_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO clinical_records (patient_id, psychologist_id, appointment_id, title, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(dto.patient_id)
        .bind(principal.id)
        .bind(dto.appointment_id)
        .bind(&dto.title)
        .bind(&dto.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create clinical record: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Clinical record {} created for patient {}",
            record_id,
            dto.patient_id
        );

        let detail = self.require_detail(record_id).await?;
        Ok(detail.into())
    }

    /// List records visible to the caller: patients those about them,
    /// psychologists those they authored, administrators all.
    pub async fn list_records(
        &self,
        principal: &Principal,
        page: &PageQuery,
    ) -> Result<(Vec<RecordDto>, i64)> {
        let (patient_filter, author_filter) = match principal.role {
            Role::Patient => (Some(principal.id), None),
            Role::Psychologist => (None, Some(principal.id)),
            Role::Administrator => (None, None),
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM clinical_records r
            WHERE ($1::uuid IS NULL OR r.patient_id = $1)
              AND ($2::uuid IS NULL OR r.psychologist_id = $2)
            "#,
        )
        .bind(patient_filter)
        .bind(author_filter)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count clinical records: {:?}", e);
            AppError::Database(e)
        })?;

        let page_sql = format!(
            r#"{DETAIL_SELECT}
            WHERE ($1::uuid IS NULL OR r.patient_id = $1)
              AND ($2::uuid IS NULL OR r.psychologist_id = $2)
            ORDER BY r.created_at DESC
            OFFSET $3 LIMIT $4
            "#
        );
        let rows = sqlx::query_as::<_, RecordDetail>(&page_sql)
            .bind(patient_filter)
            .bind(author_filter)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list clinical records: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Record detail for one of its three visible parties.
    pub async fn get_record(&self, id: Uuid, principal: &Principal) -> Result<RecordDto> {
        let detail = self.require_detail(id).await?;

        let visible = detail.patient_id == principal.id
            || detail.psychologist_id == principal.id
            || principal.role == Role::Administrator;
        if !visible {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        Ok(detail.into())
    }

    /// Amend a record. Only the author or an administrator; patients
    /// read but never write.
    pub async fn update_record(
        &self,
        id: Uuid,
        principal: &Principal,
        dto: UpdateRecordDto,
    ) -> Result<RecordDto> {
        let record = sqlx::query_as::<_, ClinicalRecord>(
            "SELECT * FROM clinical_records WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load clinical record: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Clinical record not found".to_string()))?;

        authorize_ownership(Some(principal), record.psychologist_id)?;

        sqlx::query(
            r#"
            UPDATE clinical_records
            SET title = COALESCE($2, title),
                notes = COALESCE($3, notes),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&dto.title)
        .bind(&dto.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update clinical record: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!("Clinical record {} updated", id);

        let detail = self.require_detail(id).await?;
        Ok(detail.into())
    }

    async fn require_detail(&self, id: Uuid) -> Result<RecordDetail> {
        let sql = format!("{DETAIL_SELECT} WHERE r.id = $1");
        sqlx::query_as::<_, RecordDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch clinical record: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Clinical record not found".to_string()))
    }
}
