use std::sync::Arc;

use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::guards::authorize_ownership;
use crate::features::auth::models::Principal;
use crate::features::files::dtos::{extension_for, FileResponseDto};
use crate::features::files::models::StoredFile;
use crate::modules::storage::StorageClient;

pub struct FileService {
    pool: PgPool,
    storage: Arc<StorageClient>,
}

impl FileService {
    pub fn new(pool: PgPool, storage: Arc<StorageClient>) -> Self {
        Self { pool, storage }
    }

    /// Upload an image to object storage and record it. Size and
    /// content-type screening happens in the handler; this trusts its
    /// inputs.
    pub async fn upload_image(
        &self,
        uploader_id: Uuid,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<FileResponseDto> {
        let size_bytes = data.len() as i64;

        let extension = extension_for(content_type)
            .ok_or_else(|| AppError::BadRequest("Unsupported image type".to_string()))?;
        let object_key = self
            .storage
            .generate_key(&format!("{}/{}.{}", uploader_id, Uuid::new_v4(), extension));

        self.storage.upload(&object_key, data, content_type).await?;
        debug!("Image uploaded to storage: {}", object_key);

        let public_url = self.storage.public_url(&object_key);

        let file = sqlx::query_as::<_, StoredFile>(
            r#"
            INSERT INTO stored_files (uploader_id, object_key, public_url, content_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(uploader_id)
        .bind(&object_key)
        .bind(&public_url)
        .bind(content_type)
        .bind(size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record uploaded file: {:?}", e);
            AppError::Database(e)
        })?;

        info!(
            "File stored: id={}, key={}, size={}",
            file.id, file.object_key, file.size_bytes
        );

        Ok(file.into())
    }

    /// Delete an uploaded image from storage and the record of it.
    /// Only the uploader or an administrator may delete.
    pub async fn delete_file(&self, id: Uuid, principal: &Principal) -> Result<()> {
        let file = sqlx::query_as::<_, StoredFile>("SELECT * FROM stored_files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load stored file: {:?}", e);
                AppError::Database(e)
            })?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        authorize_ownership(Some(principal), file.uploader_id)?;

        self.storage.delete(&file.object_key).await?;
        debug!("Image deleted from storage: {}", file.object_key);

        sqlx::query("DELETE FROM stored_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete file record: {:?}", e);
                AppError::Database(e)
            })?;

        info!("File deleted: id={}, key={}", file.id, file.object_key);
        Ok(())
    }
}
