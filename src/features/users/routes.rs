use crate::features::users::handlers;
use crate::features::users::services::UserService;
use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

/// All user routes sit behind the auth middleware; per-route checks
/// (ownership, admin) happen in the handlers.
pub fn routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route("/api/users", get(handlers::list_users))
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/users/{id}", patch(handlers::update_user))
        .with_state(service)
}
