use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::appointments::dtos::{
    AppointmentDto, CreateAppointmentDto, ListAppointmentsQuery, UpdateAppointmentStatusDto,
};
use crate::features::appointments::models::{AppointmentDetail, AppointmentStatus};
use crate::features::auth::models::{Principal, Role};
use crate::features::notifications::services::MailerService;
use crate::shared::constants::DEFAULT_SESSION_MINUTES;
use crate::shared::pagination::PageQuery;

/// Appointment joined with both participants. Kept as one fragment so
/// every read returns the same shape.
const DETAIL_SELECT: &str = r#"
    SELECT a.id, a.patient_id, pat.full_name AS patient_name,
           a.psychologist_id, prof.user_id AS psychologist_user_id,
           doc.full_name AS psychologist_name,
           a.scheduled_at, a.duration_minutes, a.price, a.status,
           a.notes, a.cancellation_reason, a.created_at, a.updated_at
    FROM appointments a
    JOIN users pat ON pat.id = a.patient_id
    JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
    JOIN users doc ON doc.id = prof.user_id"#;

pub struct AppointmentService {
    pool: PgPool,
    mailer: Arc<MailerService>,
}

impl AppointmentService {
    pub fn new(pool: PgPool, mailer: Arc<MailerService>) -> Self {
        Self { pool, mailer }
    }

    /// Book an appointment with a verified psychologist. The session
    /// price is captured from the profile at booking time, so later
    /// price changes never touch existing bookings.
    pub async fn create_appointment(
        &self,
        patient_id: Uuid,
        dto: CreateAppointmentDto,
    ) -> Result<AppointmentDto> {
        if dto.scheduled_at <= Utc::now() {
            return Err(AppError::Validation(
                "Appointments must be scheduled in the future".to_string(),
            ));
        }

        let psychologist = sqlx::query_as::<_, (Decimal, String, String)>(
            r#"
            SELECT prof.price_per_session, doc.email, doc.full_name
            FROM psychologist_profiles prof
            JOIN users doc ON doc.id = prof.user_id
            WHERE prof.id = $1 AND prof.is_verified = TRUE AND doc.is_active = TRUE
            "#,
        )
        .bind(dto.psychologist_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load psychologist for booking: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Psychologist not found".to_string()))?;
        let (price, psychologist_email, _psychologist_name) = psychologist;

        let duration = dto.duration_minutes.unwrap_or(DEFAULT_SESSION_MINUTES);
        let starts_at = dto.scheduled_at;
        let ends_at = starts_at + Duration::minutes(i64::from(duration));

        // Two bookings overlap when one starts before the other ends.
        // Only live bookings block the slot; cancelled ones free it.
        let slot_taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM appointments
                WHERE psychologist_id = $1
                  AND status IN ('pending', 'confirmed')
                  AND scheduled_at < $3
                  AND scheduled_at + make_interval(mins => duration_minutes) > $2
            )
            "#,
        )
        .bind(dto.psychologist_id)
        .bind(starts_at)
        .bind(ends_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check appointment overlap: {:?}", e);
            AppError::Database(e)
        })?;

        if slot_taken {
            return Err(AppError::Conflict(
                "The psychologist already has an appointment in that time slot".to_string(),
            ));
        }

        let appointment_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO appointments
                (patient_id, psychologist_id, scheduled_at, duration_minutes, price, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(patient_id)
        .bind(dto.psychologist_id)
        .bind(starts_at)
        .bind(duration)
        .bind(price)
        .bind(&dto.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create appointment: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Appointment {} booked by patient {} with psychologist profile {}",
            appointment_id,
            patient_id,
            dto.psychologist_id
        );

        let detail = self.require_detail(appointment_id).await?;

        self.mailer.send_detached(
            psychologist_email,
            "New appointment request".to_string(),
            format!(
                "{} requested a session on {}. Confirm or decline it from your dashboard.",
                detail.patient_name,
                detail.scheduled_at.format("%Y-%m-%d %H:%M UTC")
            ),
        );

        Ok(detail.into())
    }

    /// List appointments visible to the caller: patients see their own
    /// bookings, psychologists their schedule, administrators all.
    pub async fn list_appointments(
        &self,
        principal: &Principal,
        status: Option<AppointmentStatus>,
        page: &PageQuery,
    ) -> Result<(Vec<AppointmentDto>, i64)> {
        let (patient_filter, psychologist_filter) = match principal.role {
            Role::Patient => (Some(principal.id), None),
            Role::Administrator => (None, None),
            Role::Psychologist => {
                let profile_id = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM psychologist_profiles WHERE user_id = $1",
                )
                .bind(principal.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to resolve psychologist profile: {:?}", e);
                    AppError::Database(e)
                })?;
                match profile_id {
                    Some(id) => (None, Some(id)),
                    // No profile yet means no schedule to show.
                    None => return Ok((Vec::new(), 0)),
                }
            }
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM appointments a
            WHERE ($1::uuid IS NULL OR a.patient_id = $1)
              AND ($2::uuid IS NULL OR a.psychologist_id = $2)
              AND ($3::appointment_status IS NULL OR a.status = $3)
            "#,
        )
        .bind(patient_filter)
        .bind(psychologist_filter)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count appointments: {:?}", e);
            AppError::Database(e)
        })?;

        let page_sql = format!(
            r#"{DETAIL_SELECT}
            WHERE ($1::uuid IS NULL OR a.patient_id = $1)
              AND ($2::uuid IS NULL OR a.psychologist_id = $2)
              AND ($3::appointment_status IS NULL OR a.status = $3)
            ORDER BY a.scheduled_at DESC
            OFFSET $4 LIMIT $5
            "#
        );
        let rows = sqlx::query_as::<_, AppointmentDetail>(&page_sql)
            .bind(patient_filter)
            .bind(psychologist_filter)
            .bind(status)
            .bind(page.offset())
            .bind(page.limit())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list appointments: {:?}", e);
                AppError::Database(e)
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Appointment detail for a participant or an administrator.
    pub async fn get_appointment(&self, id: Uuid, principal: &Principal) -> Result<AppointmentDto> {
        let detail = self.require_detail(id).await?;
        ensure_participant(&detail, principal)?;
        Ok(detail.into())
    }

    /// Move an appointment through its lifecycle. Confirmation and
    /// completion belong to the psychologist (or an administrator);
    /// either participant may cancel while the booking is still live.
    pub async fn update_status(
        &self,
        id: Uuid,
        principal: &Principal,
        dto: UpdateAppointmentStatusDto,
    ) -> Result<AppointmentDto> {
        let detail = self.require_detail(id).await?;
        ensure_participant(&detail, principal)?;

        if !detail.status.can_transition_to(dto.status) {
            return Err(AppError::Conflict(format!(
                "Cannot change appointment status from {} to {}",
                detail.status.as_str(),
                dto.status.as_str()
            )));
        }

        let is_psychologist_side = detail.psychologist_user_id == principal.id
            || principal.role == Role::Administrator;
        match dto.status {
            AppointmentStatus::Confirmed => {
                if !is_psychologist_side {
                    return Err(AppError::Forbidden(
                        "Only the psychologist can confirm an appointment".to_string(),
                    ));
                }
            }
            AppointmentStatus::Completed => {
                if !is_psychologist_side {
                    return Err(AppError::Forbidden(
                        "Only the psychologist can complete an appointment".to_string(),
                    ));
                }
            }
            AppointmentStatus::Cancelled | AppointmentStatus::Pending => {}
        }

        let reason = if dto.status == AppointmentStatus::Cancelled {
            dto.cancellation_reason.clone()
        } else {
            None
        };

        sqlx::query(
            r#"
            UPDATE appointments
            SET status = $2,
                cancellation_reason = COALESCE($3, cancellation_reason),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(dto.status)
        .bind(&reason)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update appointment status: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Appointment {} moved from {} to {}",
            id,
            detail.status.as_str(),
            dto.status.as_str()
        );

        let updated = self.require_detail(id).await?;
        self.notify_status_change(&updated, principal).await?;

        Ok(updated.into())
    }

    /// Confirm a pending appointment without a user request, used by
    /// the payment webhook once a booking is paid.
    pub async fn confirm_paid(&self, id: Uuid) -> Result<()> {
        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE appointments
            SET status = 'confirmed', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to confirm paid appointment: {:?}", e);
            AppError::Database(e)
        })?;

        if updated.is_none() {
            // Already confirmed, cancelled or completed; payment alone
            // never drags an appointment back through the lifecycle.
            tracing::info!("Appointment {} not in pending state, skipping auto-confirm", id);
            return Ok(());
        }

        if let Some(detail) = self.fetch_detail(id).await? {
            if let Some((patient_email, _)) = self.participant_emails(id).await? {
                self.mailer.send_detached(
                    patient_email,
                    "Appointment confirmed".to_string(),
                    format!(
                        "Your session with {} on {} is confirmed.",
                        detail.psychologist_name,
                        detail.scheduled_at.format("%Y-%m-%d %H:%M UTC")
                    ),
                );
            }
        }

        Ok(())
    }

    async fn notify_status_change(
        &self,
        detail: &AppointmentDetail,
        actor: &Principal,
    ) -> Result<()> {
        let Some((patient_email, psychologist_email)) = self.participant_emails(detail.id).await?
        else {
            return Ok(());
        };
        let when = detail.scheduled_at.format("%Y-%m-%d %H:%M UTC");

        match detail.status {
            AppointmentStatus::Confirmed => {
                self.mailer.send_detached(
                    patient_email,
                    "Appointment confirmed".to_string(),
                    format!(
                        "Your session with {} on {} is confirmed.",
                        detail.psychologist_name, when
                    ),
                );
            }
            AppointmentStatus::Completed => {
                self.mailer.send_detached(
                    patient_email,
                    "How was your session?".to_string(),
                    format!(
                        "Your session with {} is complete. Leaving a review helps other patients.",
                        detail.psychologist_name
                    ),
                );
            }
            AppointmentStatus::Cancelled => {
                let reason = detail
                    .cancellation_reason
                    .as_deref()
                    .unwrap_or("No reason given");
                if detail.patient_id != actor.id {
                    self.mailer.send_detached(
                        patient_email,
                        "Appointment cancelled".to_string(),
                        format!(
                            "Your session with {} on {} was cancelled. {}",
                            detail.psychologist_name, when, reason
                        ),
                    );
                }
                if detail.psychologist_user_id != actor.id {
                    self.mailer.send_detached(
                        psychologist_email,
                        "Appointment cancelled".to_string(),
                        format!(
                            "The session with {} on {} was cancelled. {}",
                            detail.patient_name, when, reason
                        ),
                    );
                }
            }
            AppointmentStatus::Pending => {}
        }

        Ok(())
    }

    async fn participant_emails(&self, id: Uuid) -> Result<Option<(String, String)>> {
        sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT pat.email, doc.email
            FROM appointments a
            JOIN users pat ON pat.id = a.patient_id
            JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
            JOIN users doc ON doc.id = prof.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load participant emails: {:?}", e);
            AppError::Database(e)
        })
    }

    async fn fetch_detail(&self, id: Uuid) -> Result<Option<AppointmentDetail>> {
        let sql = format!("{DETAIL_SELECT} WHERE a.id = $1");
        sqlx::query_as::<_, AppointmentDetail>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch appointment: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn require_detail(&self, id: Uuid) -> Result<AppointmentDetail> {
        self.fetch_detail(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
    }
}

/// Participants are the booking patient and the booked psychologist;
/// administrators pass as well. The denial never names the resource.
fn ensure_participant(detail: &AppointmentDetail, principal: &Principal) -> Result<()> {
    let participant = detail.patient_id == principal.id
        || detail.psychologist_user_id == principal.id
        || principal.role == Role::Administrator;
    if participant {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::test_principal;
    use chrono::TimeZone;

    fn sample_detail(patient_id: Uuid, psychologist_user_id: Uuid) -> AppointmentDetail {
        AppointmentDetail {
            id: Uuid::new_v4(),
            patient_id,
            patient_name: "Pat".to_string(),
            psychologist_id: Uuid::new_v4(),
            psychologist_user_id,
            psychologist_name: "Doc".to_string(),
            scheduled_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap(),
            duration_minutes: 60,
            price: Decimal::new(75_00, 2),
            status: AppointmentStatus::Pending,
            notes: None,
            cancellation_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_patient_is_participant() {
        let principal = test_principal(Role::Patient);
        let detail = sample_detail(principal.id, Uuid::new_v4());
        assert!(ensure_participant(&detail, &principal).is_ok());
    }

    #[test]
    fn test_psychologist_is_participant() {
        let principal = test_principal(Role::Psychologist);
        let detail = sample_detail(Uuid::new_v4(), principal.id);
        assert!(ensure_participant(&detail, &principal).is_ok());
    }

    #[test]
    fn test_administrator_is_always_participant() {
        let principal = test_principal(Role::Administrator);
        let detail = sample_detail(Uuid::new_v4(), Uuid::new_v4());
        assert!(ensure_participant(&detail, &principal).is_ok());
    }

    #[test]
    fn test_stranger_is_denied_without_detail() {
        let principal = test_principal(Role::Patient);
        let detail = sample_detail(Uuid::new_v4(), Uuid::new_v4());
        let err = ensure_participant(&detail, &principal).unwrap_err();
        match err {
            AppError::Forbidden(message) => {
                assert_eq!(message, "Access denied");
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }
}
