use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{authorize_ownership, RequireAdmin};
use crate::features::auth::models::Principal;
use crate::features::users::dtos::{ListUsersQuery, UpdateUserDto, UserDto};
use crate::features::users::services::UserService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Get one account by id
///
/// Accessible to the account owner and administrators. The ownership
/// check runs before the lookup, so outsiders get the same 403 whether
/// the id exists or not.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "User retrieved", body = ApiResponse<UserDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    principal: Principal,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserDto>>> {
    authorize_ownership(Some(&principal), id)?;

    let user = service.get_user(id).await?;
    Ok(Json(ApiResponse::success(Some(user), None)))
}

/// Update an account profile
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User id")),
    request_body = UpdateUserDto,
    responses(
        (status = 200, description = "User updated", body = ApiResponse<UserDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "User not found")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    principal: Principal,
    State(service): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    AppJson(dto): AppJson<UpdateUserDto>,
) -> Result<Json<ApiResponse<UserDto>>> {
    authorize_ownership(Some(&principal), id)?;

    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = service.update_user(id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(user),
        Some("Profile updated successfully".to_string()),
    )))
}

/// List accounts (administrators only)
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Paginated accounts", body = Paginated<UserDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator role required")
    ),
    tag = "users",
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    _admin: RequireAdmin,
    State(service): State<Arc<UserService>>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<Paginated<UserDto>>> {
    let page_query = params.page_query();
    let (users, total) = service.list_users(params.role, &page_query).await?;
    Ok(Json(Paginated::new(users, total, &page_query)))
}
