use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;

/// Moderation routes. They sit behind the auth middleware and every
/// handler re-checks the administrator role.
pub fn routes(service: Arc<AdminService>) -> Router {
    Router::new()
        .route("/api/admin/users", get(handlers::list_users))
        .route(
            "/api/admin/users/{id}/status",
            patch(handlers::update_user_status),
        )
        .route(
            "/api/admin/psychologists",
            get(handlers::list_psychologists),
        )
        .route(
            "/api/admin/psychologists/{id}/verify",
            post(handlers::verify_psychologist),
        )
        .route("/api/admin/overview", get(handlers::get_overview))
        .with_state(service)
}
