use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::admin::dtos::{
    ListProfilesAdminQuery, ListUsersAdminQuery, OverviewDto, UpdateUserStatusDto,
};
use crate::features::admin::services::AdminService;
use crate::features::auth::guards::RequireAdmin;
use crate::features::psychologists::dtos::PsychologistProfileDto;
use crate::features::users::dtos::UserDto;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// List all accounts with moderation filters
#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(ListUsersAdminQuery),
    responses(
        (status = 200, description = "Paginated accounts", body = Paginated<UserDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    _admin: RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<ListUsersAdminQuery>,
) -> Result<Json<Paginated<UserDto>>> {
    let page_query = params.page_query();
    let (users, total) = service
        .list_users(params.role, params.is_active, &page_query)
        .await?;
    Ok(Json(Paginated::new(users, total, &page_query)))
}

/// Ban or reinstate an account
///
/// Bans are enforced by the per-request account check, so the target is
/// locked out on their next call even with a still-valid token.
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/status",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserStatusDto,
    responses(
        (status = 200, description = "Account status updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "User not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn update_user_status(
    RequireAdmin(principal): RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateUserStatusDto>,
) -> Result<Json<ApiResponse<UserDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.set_user_status(&principal, id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(user),
        Some("Account status updated successfully".to_string()),
    )))
}

/// List psychologist profiles for moderation
///
/// Unlike the public search this includes unverified profiles; pass
/// `verified=false` for the review queue.
#[utoipa::path(
    get,
    path = "/api/admin/psychologists",
    params(ListProfilesAdminQuery),
    responses(
        (status = 200, description = "Paginated profiles", body = Paginated<PsychologistProfileDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn list_psychologists(
    _admin: RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Query(params): Query<ListProfilesAdminQuery>,
) -> Result<Json<Paginated<PsychologistProfileDto>>> {
    let page_query = params.page_query();
    let (profiles, total) = service.list_profiles(params.verified, &page_query).await?;
    Ok(Json(Paginated::new(profiles, total, &page_query)))
}

/// Verify a psychologist profile
#[utoipa::path(
    post,
    path = "/api/admin/psychologists/{id}/verify",
    params(("id" = Uuid, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile verified", body = ApiResponse<PsychologistProfileDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required"),
        (status = 404, description = "Profile not found")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn verify_psychologist(
    _admin: RequireAdmin,
    State(service): State<Arc<AdminService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<PsychologistProfileDto>>> {
    let profile = service.verify_profile(id).await?;
    Ok(Json(ApiResponse::success(
        Some(profile),
        Some("Profile verified successfully".to_string()),
    )))
}

/// Platform overview counts
#[utoipa::path(
    get,
    path = "/api/admin/overview",
    responses(
        (status = 200, description = "Platform counts", body = ApiResponse<OverviewDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "admin",
    security(("bearer_auth" = []))
)]
pub async fn get_overview(
    _admin: RequireAdmin,
    State(service): State<Arc<AdminService>>,
) -> Result<Json<ApiResponse<OverviewDto>>> {
    let overview = service.overview().await?;
    Ok(Json(ApiResponse::success(Some(overview), None)))
}
