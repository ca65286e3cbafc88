use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::files::models::StoredFile;

/// Upload form for OpenAPI documentation.
/// The handler itself reads axum's Multipart extractor directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadImageForm {
    /// The image to upload (JPEG, PNG or WebP)
    #[schema(value_type = String, format = Binary)]
    pub file: String,
}

/// Uploaded image as returned to clients
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileResponseDto {
    pub id: Uuid,
    pub url: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub created_at: DateTime<Utc>,
}

impl From<StoredFile> for FileResponseDto {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id,
            url: file.public_url,
            content_type: file.content_type,
            size_bytes: file.size_bytes,
            created_at: file.created_at,
        }
    }
}

/// File extension for an accepted image content type
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::ALLOWED_IMAGE_TYPES;

    #[test]
    fn test_every_allowed_type_has_an_extension() {
        for content_type in ALLOWED_IMAGE_TYPES {
            assert!(extension_for(content_type).is_some(), "{}", content_type);
        }
    }

    #[test]
    fn test_unknown_types_have_no_extension() {
        assert!(extension_for("application/pdf").is_none());
        assert!(extension_for("image/svg+xml").is_none());
    }
}
