use std::sync::Arc;

use axum::routing::{get, patch};
use axum::Router;

use crate::features::appointments::handlers;
use crate::features::appointments::services::AppointmentService;

/// All appointment routes require authentication; who sees what is
/// decided per handler.
pub fn routes(service: Arc<AppointmentService>) -> Router {
    Router::new()
        .route(
            "/api/appointments",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route("/api/appointments/{id}", get(handlers::get_appointment))
        .route(
            "/api/appointments/{id}/status",
            patch(handlers::update_appointment_status),
        )
        .with_state(service)
}
