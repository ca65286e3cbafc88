use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::features::reviews::handlers;
use crate::features::reviews::services::ReviewService;

/// Anyone can read a verified psychologist's reviews.
pub fn public_routes(service: Arc<ReviewService>) -> Router {
    Router::new()
        .route(
            "/api/psychologists/{id}/reviews",
            get(handlers::list_psychologist_reviews),
        )
        .with_state(service)
}

pub fn protected_routes(service: Arc<ReviewService>) -> Router {
    Router::new()
        .route("/api/reviews", post(handlers::create_review))
        .route("/api/reviews/{id}", delete(handlers::delete_review))
        .with_state(service)
}
