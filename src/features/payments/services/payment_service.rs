use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::config::PaymentConfig;
use crate::core::error::{AppError, Result};
use crate::features::appointments::models::AppointmentStatus;
use crate::features::appointments::services::AppointmentService;
use crate::features::auth::guards::authorize_ownership;
use crate::features::auth::models::{Principal, Role};
use crate::features::notifications::services::MailerService;
use crate::features::payments::dtos::{CreatePaymentDto, PaymentDto, WebhookEventDto};
use crate::features::payments::models::{Payment, PaymentStatus};
use crate::shared::pagination::PageQuery;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the gateway's HMAC-SHA256 signature (hex) over the
/// raw request body
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-webhook-signature";

pub struct PaymentService {
    pool: PgPool,
    appointments: Arc<AppointmentService>,
    mailer: Arc<MailerService>,
    webhook_secret: String,
    currency: String,
}

impl PaymentService {
    pub fn new(
        pool: PgPool,
        appointments: Arc<AppointmentService>,
        mailer: Arc<MailerService>,
        config: &PaymentConfig,
    ) -> Self {
        Self {
            pool,
            appointments,
            mailer,
            webhook_secret: config.webhook_secret.clone(),
            currency: config.currency.clone(),
        }
    }

    /// Start a payment for one of the caller's appointments. The
    /// amount is always the price captured on the appointment; clients
    /// never send amounts.
    pub async fn create_payment(
        &self,
        principal: &Principal,
        dto: CreatePaymentDto,
    ) -> Result<PaymentDto> {
        let appointment = sqlx::query_as::<_, (Uuid, Decimal, AppointmentStatus)>(
            "SELECT patient_id, price, status FROM appointments WHERE id = $1",
        )
        .bind(dto.appointment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load appointment for payment: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
        let (owner_id, price, status) = appointment;

        authorize_ownership(Some(principal), owner_id)?;

        if !matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed) {
            return Err(AppError::Conflict(
                "Only active appointments can be paid".to_string(),
            ));
        }

        let already_paid = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE appointment_id = $1 AND status <> 'failed')",
        )
        .bind(dto.appointment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check existing payments: {:?}", e);
            AppError::Database(e)
        })?;

        if already_paid {
            return Err(AppError::Conflict(
                "A payment already exists for this appointment".to_string(),
            ));
        }

        let reference = sqlx::query_scalar::<_, String>(
            "SELECT 'PAY-' || TO_CHAR(NOW(), 'YYYY') || '-' || \
             LPAD(NEXTVAL('payment_reference_seq')::TEXT, 7, '0')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to generate payment reference: {:?}", e);
            AppError::Database(e)
        })?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (appointment_id, patient_id, amount, currency, reference)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(dto.appointment_id)
        .bind(principal.id)
        .bind(price)
        .bind(&self.currency)
        .bind(&reference)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            // The partial unique index closes the race between two
            // concurrent create calls for the same appointment.
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
                "A payment already exists for this appointment".to_string(),
            ),
            _ => {
                tracing::error!("Failed to create payment: {:?}", e);
                AppError::Database(e)
            }
        })?;

        tracing::info!(
            "Payment {} created for appointment {}",
            payment.reference,
            payment.appointment_id
        );

        Ok(payment.into())
    }

    /// List payments visible to the caller: patients their own,
    /// psychologists those on their appointments, administrators all.
    pub async fn list_payments(
        &self,
        principal: &Principal,
        status: Option<PaymentStatus>,
        page: &PageQuery,
    ) -> Result<(Vec<PaymentDto>, i64)> {
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
                    None => return Ok((Vec::new(), 0)),
                }
            }
        };

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM payments p
            JOIN appointments a ON a.id = p.appointment_id
            WHERE ($1::uuid IS NULL OR p.patient_id = $1)
              AND ($2::uuid IS NULL OR a.psychologist_id = $2)
              AND ($3::payment_status IS NULL OR p.status = $3)
            "#,
        )
        .bind(patient_filter)
        .bind(psychologist_filter)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to count payments: {:?}", e);
            AppError::Database(e)
        })?;

        let rows = sqlx::query_as::<_, Payment>(
            r#"
            SELECT p.*
            FROM payments p
            JOIN appointments a ON a.id = p.appointment_id
            WHERE ($1::uuid IS NULL OR p.patient_id = $1)
              AND ($2::uuid IS NULL OR a.psychologist_id = $2)
              AND ($3::payment_status IS NULL OR p.status = $3)
            ORDER BY p.created_at DESC
            OFFSET $4 LIMIT $5
            "#,
        )
        .bind(patient_filter)
        .bind(psychologist_filter)
        .bind(status)
        .bind(page.offset())
        .bind(page.limit())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list payments: {:?}", e);
            AppError::Database(e)
        })?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    /// Payment detail for the paying patient, the psychologist of the
    /// appointment, or an administrator.
    pub async fn get_payment(&self, id: Uuid, principal: &Principal) -> Result<PaymentDto> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch payment: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("Payment not found".to_string()))?;

        let psychologist_user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT prof.user_id
            FROM appointments a
            JOIN psychologist_profiles prof ON prof.id = a.psychologist_id
            WHERE a.id = $1
            "#,
        )
        .bind(payment.appointment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to resolve payment participants: {:?}", e);
            AppError::Database(e)
        })?;

        let participant = payment.patient_id == principal.id
            || psychologist_user_id == principal.id
            || principal.role == Role::Administrator;
        if !participant {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }

        Ok(payment.into())
    }

    /// Apply a gateway status notification. The signature is checked
    /// against the raw body before anything else happens; a bad
    /// signature has no side effects at all.
    pub async fn handle_webhook(&self, signature: Option<&str>, body: &[u8]) -> Result<()> {
        let Some(signature) = signature else {
            return Err(AppError::Unauthorized(
                "Missing webhook signature".to_string(),
            ));
        };
        if !verify_signature(&self.webhook_secret, body, signature) {
            return Err(AppError::Unauthorized(
                "Invalid webhook signature".to_string(),
            ));
        }

        let payload: serde_json::Value = serde_json::from_slice(body)
            .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;
        let event: WebhookEventDto = serde_json::from_value(payload.clone())
            .map_err(|_| AppError::BadRequest("Invalid webhook payload".to_string()))?;

        let payment =
            sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE reference = $1")
                .bind(&event.reference)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to look up payment reference: {:?}", e);
                    AppError::Database(e)
                })?
                .ok_or_else(|| AppError::NotFound("Unknown payment reference".to_string()))?;

        if payment.status == event.status {
            // Gateways retry; replaying the same status is fine.
            tracing::info!(
                "Webhook for {} repeated status {}, ignoring",
                payment.reference,
                event.status.as_str()
            );
            return Ok(());
        }

        if !payment.status.can_transition_to(event.status) {
            return Err(AppError::Conflict(format!(
                "Payment cannot move from {} to {}",
                payment.status.as_str(),
                event.status.as_str()
            )));
        }

        let paid_at = match event.status {
            PaymentStatus::Paid => Some(event.paid_at.unwrap_or_else(Utc::now)),
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE payments
            SET status = $2,
                gateway_payload = $3,
                paid_at = COALESCE($4, paid_at),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment.id)
        .bind(event.status)
        .bind(&payload)
        .bind(paid_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to apply webhook update: {:?}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "Payment {} moved from {} to {}",
            payment.reference,
            payment.status.as_str(),
            event.status.as_str()
        );

        if event.status == PaymentStatus::Paid {
            self.appointments.confirm_paid(payment.appointment_id).await?;
            self.send_receipt(&payment).await?;
        }

        Ok(())
    }

    async fn send_receipt(&self, payment: &Payment) -> Result<()> {
        let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
            .bind(payment.patient_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load payer email: {:?}", e);
                AppError::Database(e)
            })?;

        self.mailer.send_detached(
            email,
            "Payment received".to_string(),
            format!(
                "We received your payment of {} {} (reference {}). Thank you.",
                payment.amount, payment.currency, payment.reference
            ),
        );
        Ok(())
    }
}

/// Constant-time check of the gateway signature: hex-encoded
/// HMAC-SHA256 of the raw body under the shared webhook secret.
fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let body = br#"{"reference":"PAY-2026-0000001","status":"paid"}"#;
        let signature = sign("topsecret", body);
        assert!(verify_signature("topsecret", body, &signature));
    }

    #[test]
    fn test_signature_with_surrounding_whitespace_accepted() {
        let body = b"{}";
        let signature = format!("  {}  ", sign("topsecret", body));
        assert!(verify_signature("topsecret", body, &signature));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign("topsecret", b"{\"status\":\"paid\"}");
        assert!(!verify_signature("topsecret", b"{\"status\":\"refunded\"}", &signature));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"{}";
        let signature = sign("topsecret", body);
        assert!(!verify_signature("othersecret", body, &signature));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        assert!(!verify_signature("topsecret", b"{}", "not-hex-at-all"));
        assert!(!verify_signature("topsecret", b"{}", ""));
    }

    #[test]
    fn test_webhook_event_parses() {
        let event: WebhookEventDto = serde_json::from_str(
            r#"{"reference":"PAY-2026-0000001","status":"paid","paid_at":"2026-03-14T09:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(event.reference, "PAY-2026-0000001");
        assert_eq!(event.status, PaymentStatus::Paid);
        assert!(event.paid_at.is_some());
    }

    #[test]
    fn test_webhook_event_rejects_unknown_status() {
        let parsed = serde_json::from_str::<WebhookEventDto>(
            r#"{"reference":"PAY-2026-0000001","status":"settled"}"#,
        );
        assert!(parsed.is_err());
    }
}
