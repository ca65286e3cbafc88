use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::dtos::{
    AuthResponseDto, AuthUserDto, ChangePasswordRequestDto, LoginRequestDto, RegisterRequestDto,
};
use crate::features::auth::models::Principal;
use crate::features::auth::services::AuthService;
use crate::shared::types::ApiResponse;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequestDto,
    responses(
        (status = 201, description = "Account registered successfully", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<RegisterRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_response = service.register(dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(Some(auth_response), None)),
    ))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequestDto,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<AuthResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials or inactive account")
    ),
    tag = "auth"
)]
pub async fn login(
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<LoginRequestDto>,
) -> Result<Json<ApiResponse<AuthResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let auth_response = service.login(dto).await?;
    Ok(Json(ApiResponse::success(Some(auth_response), None)))
}

/// Get current authenticated user info
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user retrieved successfully", body = ApiResponse<AuthUserDto>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    principal: Principal,
    State(service): State<Arc<AuthService>>,
) -> Result<Json<ApiResponse<AuthUserDto>>> {
    let user = service.get_current_user(&principal).await?;
    Ok(Json(ApiResponse::success(Some(user), None)))
}

/// Change the current user's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    request_body = ChangePasswordRequestDto,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Current password incorrect")
    ),
    tag = "auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn change_password(
    principal: Principal,
    State(service): State<Arc<AuthService>>,
    AppJson(dto): AppJson<ChangePasswordRequestDto>,
) -> Result<Json<ApiResponse<()>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    service.change_password(&principal, dto).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Password changed".to_string()),
    )))
}
