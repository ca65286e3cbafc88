use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use uuid::Uuid;

use crate::core::error::Result;
use crate::core::extractor::AppJson;
use crate::features::auth::guards::RequirePatient;
use crate::features::auth::models::Principal;
use crate::features::payments::dtos::{
    CreatePaymentDto, ListPaymentsQuery, PaymentDto, WebhookEventDto,
};
use crate::features::payments::services::payment_service::WEBHOOK_SIGNATURE_HEADER;
use crate::features::payments::services::PaymentService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Start a payment for an appointment
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    request_body = CreatePaymentDto,
    responses(
        (status = 201, description = "Payment created"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment already has a payment")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_payment(
    State(service): State<Arc<PaymentService>>,
    RequirePatient(principal): RequirePatient,
    AppJson(dto): AppJson<CreatePaymentDto>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentDto>>)> {
    let payment = service.create_payment(&principal, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(payment),
            Some("Payment created successfully".to_string()),
        )),
    ))
}

/// List the caller's payments (administrators see all)
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    params(ListPaymentsQuery),
    responses((status = 200, description = "Paginated list of payments")),
    security(("bearer_auth" = []))
)]
pub async fn list_payments(
    State(service): State<Arc<PaymentService>>,
    principal: Principal,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<Paginated<PaymentDto>>> {
    let (payments, total) = service
        .list_payments(&principal, query.status, &query.page_query())
        .await?;
    Ok(Json(Paginated::new(payments, total, &query.page_query())))
}

/// Payment detail for a participant
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    params(("id" = Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment detail"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Payment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_payment(
    State(service): State<Arc<PaymentService>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentDto>>> {
    let payment = service.get_payment(id, &principal).await?;
    Ok(Json(ApiResponse::success(Some(payment), None)))
}

/// Gateway callback. Authenticated by an HMAC signature over the raw
/// body, not by a user credential.
#[utoipa::path(
    post,
    path = "/api/payments/webhook",
    tag = "payments",
    request_body = WebhookEventDto,
    responses(
        (status = 200, description = "Webhook processed"),
        (status = 401, description = "Missing or invalid signature"),
        (status = 404, description = "Unknown payment reference")
    )
)]
pub async fn payment_webhook(
    State(service): State<Arc<PaymentService>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<()>>> {
    let signature = headers
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    service.handle_webhook(signature, &body).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Webhook processed".to_string()),
    )))
}
