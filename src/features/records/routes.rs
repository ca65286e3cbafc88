use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::features::records::handlers;
use crate::features::records::services::RecordService;

/// Clinical records never have a public surface.
pub fn routes(service: Arc<RecordService>) -> Router {
    Router::new()
        .route(
            "/api/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/records/{id}",
            get(handlers::get_record).patch(handlers::update_record),
        )
        .with_state(service)
}
