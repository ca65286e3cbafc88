use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::appointments::dtos::{
    AppointmentDto, CreateAppointmentDto, ListAppointmentsQuery, UpdateAppointmentStatusDto,
};
use crate::features::appointments::services::AppointmentService;
use crate::features::auth::guards::RequirePatient;
use crate::features::auth::models::Principal;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Book an appointment with a psychologist
#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "appointments",
    request_body = CreateAppointmentDto,
    responses(
        (status = 201, description = "Appointment booked"),
        (status = 404, description = "Psychologist not found"),
        (status = 409, description = "Time slot already taken")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_appointment(
    State(service): State<Arc<AppointmentService>>,
    RequirePatient(principal): RequirePatient,
    AppJson(dto): AppJson<CreateAppointmentDto>,
) -> Result<(StatusCode, Json<ApiResponse<AppointmentDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let appointment = service.create_appointment(principal.id, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(appointment),
            Some("Appointment booked successfully".to_string()),
        )),
    ))
}

/// List the caller's appointments (administrators see all)
#[utoipa::path(
    get,
    path = "/api/appointments",
    tag = "appointments",
    params(ListAppointmentsQuery),
    responses((status = 200, description = "Paginated list of appointments")),
    security(("bearer_auth" = []))
)]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentService>>,
    principal: Principal,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Paginated<AppointmentDto>>> {
    let (appointments, total) = service
        .list_appointments(&principal, query.status, &query.page_query())
        .await?;
    Ok(Json(Paginated::new(appointments, total, &query.page_query())))
}

/// Appointment detail for a participant
#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    responses(
        (status = 200, description = "Appointment detail"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Appointment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentService>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<AppointmentDto>>> {
    let appointment = service.get_appointment(id, &principal).await?;
    Ok(Json(ApiResponse::success(Some(appointment), None)))
}

/// Confirm, cancel or complete an appointment
#[utoipa::path(
    patch,
    path = "/api/appointments/{id}/status",
    tag = "appointments",
    params(("id" = Uuid, Path, description = "Appointment ID")),
    request_body = UpdateAppointmentStatusDto,
    responses(
        (status = 200, description = "Status updated"),
        (status = 403, description = "Caller may not perform this transition"),
        (status = 409, description = "Illegal lifecycle transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_appointment_status(
    State(service): State<Arc<AppointmentService>>,
    principal: Principal,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateAppointmentStatusDto>,
) -> Result<Json<ApiResponse<AppointmentDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let appointment = service.update_status(id, &principal, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(appointment),
        Some("Appointment status updated".to_string()),
    )))
}
