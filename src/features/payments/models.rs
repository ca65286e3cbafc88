use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Settlement state of a payment. `pending` may settle to `paid` or
/// `failed`; a settled payment can only move to `refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    /// Whether the gateway may move a payment from `self` to `next`.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, next), (Pending, Paid) | (Pending, Failed) | (Paid, Refunded))
    }
}

/// Database row for a payment
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub reference: String,
    pub gateway_payload: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::PaymentStatus::*;

    #[test]
    fn test_settlement_transitions() {
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Paid.can_transition_to(Refunded));
    }

    #[test]
    fn test_failed_is_terminal() {
        for next in [Pending, Paid, Failed, Refunded] {
            assert!(!Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_refund_requires_settlement() {
        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Paid));
    }
}
