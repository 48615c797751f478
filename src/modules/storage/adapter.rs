use async_trait::async_trait;

use super::staging::StagedBlob;
use crate::core::error::StorageError;

/// Identifies a stored file for later retrieval or deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageReference {
    pub file_id: String,
    pub url: String,
}

/// A cloud storage provider that receives uploaded photos
///
/// Implementations are built once from configuration at startup and shared
/// read-only between requests.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Short backend name used in logs
    fn name(&self) -> &'static str;

    /// Forward a staged blob to the provider.
    ///
    /// The blob stays owned by the caller, which removes it afterwards.
    async fn store(&self, blob: &StagedBlob) -> Result<StorageReference, StorageError>;

    /// Delete a previously stored file by its identifier.
    ///
    /// Unknown identifiers are reported as provider failures.
    async fn remove(&self, file_id: &str) -> Result<(), StorageError>;
}
