use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::{AppError, Result};
use crate::features::photos::dtos::UploadPhotoResponseDto;
use crate::modules::storage::{BlobWriter, StagedBlob, StagingArea, StorageAdapter};

/// Service for photo uploads and deletions
pub struct PhotoService {
    storage: Arc<dyn StorageAdapter>,
    staging: StagingArea,
    max_upload_size: usize,
}

impl PhotoService {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        staging: StagingArea,
        max_upload_size: usize,
    ) -> Self {
        Self {
            storage,
            staging,
            max_upload_size,
        }
    }

    pub fn max_upload_size(&self) -> usize {
        self.max_upload_size
    }

    /// Open a staged blob for an incoming upload
    pub fn begin_upload(&self, original_name: &str, mime_type: &str) -> Result<BlobWriter> {
        self.staging
            .begin(original_name, mime_type)
            .map_err(|e| AppError::Internal(format!("Failed to stage upload: {}", e)))
    }

    /// Forward a staged photo to the storage backend
    ///
    /// The staged file is removed whether or not the backend call succeeds.
    pub async fn upload_photo(&self, blob: StagedBlob) -> Result<UploadPhotoResponseDto> {
        let outcome = self.storage.store(&blob).await;

        let original_name = blob.original_name().to_string();
        if let Err(e) = blob.discard() {
            warn!("Failed to remove staged upload '{}': {}", original_name, e);
        }

        let reference = outcome.map_err(AppError::Upload)?;

        info!(
            "Photo '{}' stored on {}: file_id={}",
            original_name,
            self.storage.name(),
            reference.file_id
        );

        Ok(UploadPhotoResponseDto {
            success: true,
            url: reference.url,
            file_id: reference.file_id,
        })
    }

    /// Delete a stored photo by its identifier
    pub async fn delete_photo(&self, file_id: &str) -> Result<()> {
        self.storage
            .remove(file_id)
            .await
            .map_err(AppError::Delete)?;

        info!("Photo deleted from {}: file_id={}", self.storage.name(), file_id);
        Ok(())
    }
}
