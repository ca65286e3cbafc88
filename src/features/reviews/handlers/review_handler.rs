use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::guards::{RequireAdmin, RequirePatient};
use crate::features::reviews::dtos::{CreateReviewDto, ListReviewsQuery, ReviewDto};
use crate::features::reviews::services::ReviewService;
use crate::shared::pagination::Paginated;
use crate::shared::types::ApiResponse;

/// Review a completed appointment
#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created"),
        (status = 404, description = "Appointment not found"),
        (status = 409, description = "Appointment not completed or already reviewed")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_review(
    State(service): State<Arc<ReviewService>>,
    RequirePatient(principal): RequirePatient,
    AppJson(dto): AppJson<CreateReviewDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReviewDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let review = service.create_review(&principal, dto).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(review),
            Some("Review created successfully".to_string()),
        )),
    ))
}

/// Public reviews of a psychologist
#[utoipa::path(
    get,
    path = "/api/psychologists/{id}/reviews",
    tag = "reviews",
    params(
        ("id" = Uuid, Path, description = "Psychologist profile ID"),
        ListReviewsQuery
    ),
    responses(
        (status = 200, description = "Paginated list of reviews"),
        (status = 404, description = "Psychologist profile not found")
    )
)]
pub async fn list_psychologist_reviews(
    State(service): State<Arc<ReviewService>>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<Paginated<ReviewDto>>> {
    let (reviews, total) = service
        .list_for_psychologist(id, &query.page_query())
        .await?;
    Ok(Json(Paginated::new(reviews, total, &query.page_query())))
}

/// Remove a review (moderation)
#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    tag = "reviews",
    params(("id" = Uuid, Path, description = "Review ID")),
    responses(
        (status = 200, description = "Review deleted"),
        (status = 404, description = "Review not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_review(
    State(service): State<Arc<ReviewService>>,
    RequireAdmin(_principal): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_review(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Review deleted successfully".to_string()),
    )))
}
