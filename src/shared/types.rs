use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard envelope for non-list responses. List endpoints return
/// [`Paginated`](crate::shared::pagination::Paginated) instead.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            errors,
        }
    }
}
