use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::payments::models::{Payment, PaymentStatus};
use crate::shared::pagination::PageQuery;

/// Request body for starting a payment
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentDto {
    /// Appointment being paid for
    pub appointment_id: Uuid,
}

/// Status notification posted by the payment gateway. Field names follow
/// the gateway's snake_case wire format, not our API convention.
#[derive(Debug, Deserialize, ToSchema)]
pub struct WebhookEventDto {
    /// Payment reference issued at creation time
    pub reference: String,
    pub status: PaymentStatus,
    /// Settlement timestamp reported by the gateway
    pub paid_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing payments
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPaymentsQuery {
    /// Page number (default 1)
    #[serde(
        default = "crate::shared::pagination::default_page",
        deserialize_with = "crate::shared::pagination::lenient_page"
    )]
    pub page: i64,
    /// Items per page (default 10, max 100)
    #[serde(
        default = "crate::shared::pagination::default_limit",
        deserialize_with = "crate::shared::pagination::lenient_limit"
    )]
    pub limit: i64,
    /// Filter by settlement status
    pub status: Option<PaymentStatus>,
}

impl ListPaymentsQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Payment as returned to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Payment> for PaymentDto {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            appointment_id: payment.appointment_id,
            patient_id: payment.patient_id,
            amount: payment.amount,
            currency: payment.currency,
            status: payment.status,
            reference: payment.reference,
            paid_at: payment.paid_at,
            created_at: payment.created_at,
        }
    }
}
