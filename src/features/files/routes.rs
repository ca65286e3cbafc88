use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, post},
    Router,
};
use std::sync::Arc;

use crate::features::files::handlers::{delete_file, upload_image};
use crate::features::files::services::FileService;
use crate::shared::constants::MAX_UPLOAD_BYTES;

pub fn routes(file_service: Arc<FileService>) -> Router {
    Router::new()
        .route(
            "/api/files/upload",
            // Body limit leaves headroom for multipart overhead.
            post(upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 1024 * 1024)),
        )
        .route("/api/files/{id}", delete(delete_file))
        .with_state(file_service)
}
