use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequirePsychologist, RequirePsychologistOrAdmin};
use crate::features::auth::models::Principal;
use crate::features::records::dtos::{
    CreateRecordDto, ListRecordsQuery, RecordDto, UpdateRecordDto,
};
use crate::features::records::services::RecordService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Write a clinical record for a treated patient
#[utoipa::path(
    post,
    path = "/api/records",
    tag = "records",
    request_body = CreateRecordDto,
    responses(
        (status = 201, description = "Record created"),
        (status = 403, description = "No therapeutic relationship with the patient")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_record(
    State(service): State<Arc<RecordService>>,
    RequirePsychologist(principal): RequirePsychologist,
    AppJson(dto): AppJson<CreateRecordDto>,
) -> Result<(StatusCode, Json<ApiResponse<RecordDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service.create_record(&principal, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(record),
            Some("Record created successfully".to_string()),
        )),
    ))
}

/// List clinical records visible to the caller
#[utoipa::path(
    get,
    path = "/api/records",
    tag = "records",
    params(ListRecordsQuery),
    responses((status = 200, description = "Paginated list of records")),
    security(("bearer_auth" = []))
)]
pub async fn list_records(
    State(service): State<Arc<RecordService>>,
    principal: Principal,
    Query(query): Query<ListRecordsQuery>,
) -> Result<Json<Paginated<RecordDto>>> {
    let (records, total) = service
        .list_records(&principal, &query.page_query())
        .await?;
    Ok(Json(Paginated::new(records, total, &query.page_query())))
}

/// Clinical record detail
#[utoipa::path(
    get,
    path = "/api/records/{id}",
    tag = "records",
    params(("id" = Uuid, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record detail"),
        (status = 403, description = "Not a visible party"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_record(
    State(service): State<Arc<RecordService>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RecordDto>>> {
    let record = service.get_record(id, &principal).await?;
    Ok(Json(ApiResponse::success(Some(record), None)))
}

/// Amend a clinical record (author or administrator)
#[utoipa::path(
    patch,
    path = "/api/records/{id}",
    tag = "records",
    params(("id" = Uuid, Path, description = "Record ID")),
    request_body = UpdateRecordDto,
    responses(
        (status = 200, description = "Record updated"),
        (status = 403, description = "Not the record author"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_record(
    State(service): State<Arc<RecordService>>,
    RequirePsychologistOrAdmin(principal): RequirePsychologistOrAdmin,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateRecordDto>,
) -> Result<Json<ApiResponse<RecordDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let record = service.update_record(id, &principal, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(record),
        Some("Record updated successfully".to_string()),
    )))
}
