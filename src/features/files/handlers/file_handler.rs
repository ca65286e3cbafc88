use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::models::Principal;
use crate::features::files::dtos::{FileResponseDto, UploadImageForm};
use crate::features::files::services::FileService;
use crate::shared::constants::{ALLOWED_IMAGE_TYPES, MAX_UPLOAD_BYTES};
use crate::shared::types::ApiResponse;

/// Upload a profile image
///
/// Accepts multipart/form-data with a single `file` field.
#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(
        content = UploadImageForm,
        content_type = "multipart/form-data",
        description = "Image upload form"
    ),
    responses(
        (status = 201, description = "Image uploaded"),
        (status = 400, description = "Missing file, wrong type or too large"),
        (status = 401, description = "Authentication required")
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_image(
    State(service): State<Arc<FileService>>,
    principal: Principal,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<FileResponseDto>>)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut content_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        AppError::BadRequest(format!("Failed to read multipart data: {}", e))
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let ct = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());

                let data = field.bytes().await.map_err(|e| {
                    debug!("Failed to read file bytes: {}", e);
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                file_data = Some(data.to_vec());
                content_type = Some(ct);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    let file_data =
        file_data.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
    let content_type =
        content_type.ok_or_else(|| AppError::BadRequest("Content type is required".to_string()))?;

    if file_data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest(format!(
            "File too large. Maximum size is {} bytes",
            MAX_UPLOAD_BYTES
        )));
    }

    if !ALLOWED_IMAGE_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            content_type,
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    let response = service
        .upload_image(principal.id, file_data, &content_type)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(response),
            Some("Image uploaded successfully".to_string()),
        )),
    ))
}

/// Delete an uploaded image (uploader or administrator)
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "File deleted"),
        (status = 403, description = "Not the uploader"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    State(service): State<Arc<FileService>>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_file(id, &principal).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("File deleted successfully".to_string()),
    )))
}
