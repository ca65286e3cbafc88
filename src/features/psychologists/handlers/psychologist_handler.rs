use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequirePsychologist, RequirePsychologistOrAdmin};
use crate::features::psychologists::dtos::{
    CreateProfileDto, PsychologistProfileDto, SearchPsychologistsQuery, UpdateProfileDto,
};
use crate::features::psychologists::services::PsychologistService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Create the caller's practice profile
#[utoipa::path(
    post,
    path = "/api/psychologists",
    tag = "psychologists",
    request_body = CreateProfileDto,
    responses(
        (status = 201, description = "Profile created"),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Profile already exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_profile(
    State(service): State<Arc<PsychologistService>>,
    RequirePsychologist(principal): RequirePsychologist,
    AppJson(dto): AppJson<CreateProfileDto>,
) -> Result<(StatusCode, Json<ApiResponse<PsychologistProfileDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.create_profile(principal.id, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(profile),
            Some("Profile created successfully".to_string()),
        )),
    ))
}

/// Fetch the caller's own profile, verified or not
#[utoipa::path(
    get,
    path = "/api/psychologists/me",
    tag = "psychologists",
    responses(
        (status = 200, description = "Own profile"),
        (status = 404, description = "No profile yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_own_profile(
    State(service): State<Arc<PsychologistService>>,
    RequirePsychologist(principal): RequirePsychologist,
) -> Result<Json<ApiResponse<PsychologistProfileDto>>> {
    let profile = service.get_own_profile(principal.id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None)))
}

/// Update a practice profile (owner or administrator)
#[utoipa::path(
    patch,
    path = "/api/psychologists/{id}",
    tag = "psychologists",
    params(("id" = Uuid, Path, description = "Profile ID")),
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 403, description = "Not the profile owner"),
        (status = 404, description = "Profile not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(service): State<Arc<PsychologistService>>,
    RequirePsychologistOrAdmin(principal): RequirePsychologistOrAdmin,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateProfileDto>,
) -> Result<Json<ApiResponse<PsychologistProfileDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let profile = service.update_profile(id, &principal, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile updated successfully".to_string()),
    )))
}

/// Public directory of verified psychologists
#[utoipa::path(
    get,
    path = "/api/psychologists",
    tag = "psychologists",
    params(SearchPsychologistsQuery),
    responses(
        (status = 200, description = "Paginated list of verified psychologists"),
        (status = 400, description = "Invalid proximity filter")
    )
)]
pub async fn search_psychologists(
    State(service): State<Arc<PsychologistService>>,
    Query(query): Query<SearchPsychologistsQuery>,
) -> Result<Json<Paginated<PsychologistProfileDto>>> {
    let (profiles, total) = service.search(&query).await?;
    Ok(Json(Paginated::new(profiles, total, &query.page_query())))
}

/// Public profile detail
#[utoipa::path(
    get,
    path = "/api/psychologists/{id}",
    tag = "psychologists",
    params(("id" = Uuid, Path, description = "Profile ID")),
    responses(
        (status = 200, description = "Profile detail"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_psychologist(
    State(service): State<Arc<PsychologistService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PsychologistProfileDto>>> {
    let profile = service.get_profile(id).await?;
    Ok(Json(ApiResponse::success(Some(profile), None)))
}
