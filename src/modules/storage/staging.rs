//! Local staging area for uploads in flight
//!
//! Every upload is written to its own uniquely named file before it is forwarded
//! to the storage backend. A staged file lives exactly as long as its
//! [`StagedBlob`]: it is removed by [`StagedBlob::discard`] or, failing that,
//! when the value is dropped.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

/// Directory holding staged uploads
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
}

impl StagingArea {
    /// Open the staging directory, creating it if needed
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Start staging a new blob
    pub fn begin(&self, original_name: &str, mime_type: &str) -> io::Result<BlobWriter> {
        let file = tempfile::Builder::new()
            .prefix("photo-")
            .suffix(".upload")
            .tempfile_in(&self.dir)?;
        let (file, path) = file.into_parts();

        Ok(BlobWriter {
            file: tokio::fs::File::from_std(file),
            blob: StagedBlob {
                path,
                original_name: original_name.to_string(),
                mime_type: mime_type.to_string(),
                size: 0,
            },
        })
    }
}

/// Streams chunks into a staged blob
pub struct BlobWriter {
    file: tokio::fs::File,
    blob: StagedBlob,
}

impl BlobWriter {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.file.write_all(chunk).await?;
        self.blob.size += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far
    pub fn size(&self) -> u64 {
        self.blob.size
    }

    pub async fn finish(mut self) -> io::Result<StagedBlob> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        Ok(self.blob)
    }
}

/// An uploaded file staged on local disk
#[derive(Debug)]
pub struct StagedBlob {
    path: TempPath,
    original_name: String,
    mime_type: String,
    size: u64,
}

impl StagedBlob {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the staged bytes back
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&*self.path).await
    }

    /// Remove the staged file from disk
    pub fn discard(self) -> io::Result<()> {
        self.path.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_staged_blob_round_trip_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let area = StagingArea::new(dir.path().join("staging")).unwrap();

        let mut writer = area.begin("cat.png", "image/png").unwrap();
        writer.write_chunk(b"\x89PNG").await.unwrap();
        writer.write_chunk(b"rest").await.unwrap();
        assert_eq!(writer.size(), 8);
        let blob = writer.finish().await.unwrap();

        let path = blob.path().to_path_buf();
        assert!(path.starts_with(area.dir()));
        assert_eq!(blob.original_name(), "cat.png");
        assert_eq!(blob.mime_type(), "image/png");
        assert_eq!(blob.read().await.unwrap(), b"\x89PNGrest".to_vec());

        blob.discard().unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dropped_blob_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let area = StagingArea::new(dir.path()).unwrap();

        let mut writer = area.begin("a.jpg", "image/jpeg").unwrap();
        writer.write_chunk(b"partial").await.unwrap();
        drop(writer);

        assert_eq!(std::fs::read_dir(area.dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_blobs_use_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let area = StagingArea::new(dir.path()).unwrap();

        let first = area.begin("same.png", "image/png").unwrap().finish().await.unwrap();
        let second = area.begin("same.png", "image/png").unwrap().finish().await.unwrap();

        assert_ne!(first.path(), second.path());
    }
}
