#[cfg(test)]
use crate::core::error::StorageError;
#[cfg(test)]
use crate::modules::storage::{StagedBlob, StagingArea, StorageAdapter, StorageReference};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use axum::Router;
#[cfg(test)]
use std::net::SocketAddr;
#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::Mutex;

/// Serve a fake provider API on an ephemeral local port
#[cfg(test)]
pub async fn spawn_fake_provider(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[cfg(test)]
pub async fn stage_bytes(
    area: &StagingArea,
    original_name: &str,
    mime_type: &str,
    data: &[u8],
) -> StagedBlob {
    let mut writer = area.begin(original_name, mime_type).unwrap();
    writer.write_chunk(data).await.unwrap();
    writer.finish().await.unwrap()
}

/// What a [`RecordingStorage`] saw during `store`
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub original_name: String,
    pub mime_type: String,
    pub staged_path: PathBuf,
    pub staged_existed: bool,
    pub data: Vec<u8>,
}

/// In-memory storage adapter that records every call
#[cfg(test)]
#[derive(Default)]
pub struct RecordingStorage {
    pub uploads: Mutex<Vec<StoredUpload>>,
    pub removed: Mutex<Vec<String>>,
    pub files: Mutex<Vec<String>>,
    /// When set, `store` fails with this error
    pub store_error: Option<StorageError>,
}

#[cfg(test)]
impl RecordingStorage {
    pub fn failing(error: StorageError) -> Self {
        Self {
            store_error: Some(error),
            ..Default::default()
        }
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl StorageAdapter for RecordingStorage {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn store(&self, blob: &StagedBlob) -> Result<StorageReference, StorageError> {
        let data = blob.read().await.unwrap_or_default();
        self.uploads.lock().unwrap().push(StoredUpload {
            original_name: blob.original_name().to_string(),
            mime_type: blob.mime_type().to_string(),
            staged_path: blob.path().to_path_buf(),
            staged_existed: blob.path().exists(),
            data,
        });

        if let Some(error) = &self.store_error {
            return Err(error.clone());
        }

        let mut files = self.files.lock().unwrap();
        let file_id = format!("file-{}", files.len() + 1);
        files.push(file_id.clone());
        Ok(StorageReference {
            url: format!("https://storage.test/{}", file_id),
            file_id,
        })
    }

    async fn remove(&self, file_id: &str) -> Result<(), StorageError> {
        self.removed.lock().unwrap().push(file_id.to_string());

        let mut files = self.files.lock().unwrap();
        match files.iter().position(|f| f == file_id) {
            Some(index) => {
                files.remove(index);
                Ok(())
            }
            None => Err(StorageError::Backend(format!("File not found: {}", file_id))),
        }
    }
}
