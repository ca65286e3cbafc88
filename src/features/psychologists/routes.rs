use std::sync::Arc;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::features::psychologists::handlers;
use crate::features::psychologists::services::PsychologistService;

/// Directory routes: anyone can browse verified psychologists.
pub fn public_routes(service: Arc<PsychologistService>) -> Router {
    Router::new()
        .route("/api/psychologists", get(handlers::search_psychologists))
        .route("/api/psychologists/{id}", get(handlers::get_psychologist))
        .with_state(service)
}

/// Profile management routes, behind the auth middleware.
pub fn protected_routes(service: Arc<PsychologistService>) -> Router {
    Router::new()
        .route("/api/psychologists", post(handlers::create_profile))
        .route("/api/psychologists/me", get(handlers::get_own_profile))
        .route("/api/psychologists/{id}", patch(handlers::update_profile))
        .with_state(service)
}
