use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::features::payments::handlers;
use crate::features::payments::services::PaymentService;

/// The gateway webhook authenticates itself with a signature, so it
/// must stay outside the user auth middleware.
pub fn public_routes(service: Arc<PaymentService>) -> Router {
    Router::new()
        .route("/api/payments/webhook", post(handlers::payment_webhook))
        .with_state(service)
}

pub fn protected_routes(service: Arc<PaymentService>) -> Router {
    Router::new()
        .route(
            "/api/payments",
            get(handlers::list_payments).post(handlers::create_payment),
        )
        .route("/api/payments/{id}", get(handlers::get_payment))
        .with_state(service)
}
