//! Storage module for photo uploads
//!
//! Stages uploads on local disk and forwards them to the configured
//! cloud provider (Google Drive or Cloudinary).

mod adapter;
mod cloudinary_client;
mod google_drive;
mod staging;

use std::sync::Arc;

use crate::core::config::StorageConfig;
use crate::core::error::StorageError;

pub use adapter::{StorageAdapter, StorageReference};
pub use cloudinary_client::CloudinaryAdapter;
pub use google_drive::GoogleDriveAdapter;
pub use staging::{BlobWriter, StagedBlob, StagingArea};

/// Build the adapter for the backend chosen in configuration
pub fn build_adapter(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>, StorageError> {
    let adapter: Arc<dyn StorageAdapter> = match config {
        StorageConfig::GoogleDrive(drive) => Arc::new(GoogleDriveAdapter::new(drive.clone())?),
        StorageConfig::Cloudinary(cloudinary) => {
            Arc::new(CloudinaryAdapter::new(cloudinary.clone()))
        }
    };
    Ok(adapter)
}
