//! Google Drive storage adapter
//!
//! Uploads photos into a Drive folder owned by (or shared with) a service
//! account and makes them readable by anyone with the link.
//!
//! The target folder is either configured directly, in which case the service
//! account's write access is checked first, or resolved as `parent/child` by
//! name. Name resolution searches and then creates; two concurrent uploads may
//! both miss and create duplicate folders. Configure `GOOGLE_DRIVE_FOLDER_ID`
//! to avoid that.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::token_manager::GoogleTokenManager;
use crate::core::config::GoogleDriveConfig;
use crate::core::error::StorageError;
use crate::modules::storage::{StagedBlob, StorageAdapter, StorageReference};
use crate::shared::constants::DRIVE_FOLDER_MIME_TYPE;

/// Direct-content URL for a publicly readable Drive file
pub fn direct_content_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?export=view&id={}", file_id)
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FolderCapabilities {
    #[serde(default)]
    can_add_children: bool,
}

#[derive(Debug, Deserialize)]
struct FolderMetadata {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    capabilities: FolderCapabilities,
}

#[derive(Debug, Deserialize)]
struct DriveErrorBody {
    error: DriveErrorDetail,
}

#[derive(Debug, Deserialize)]
struct DriveErrorDetail {
    #[serde(default)]
    message: String,
}

/// Storage adapter backed by Google Drive
pub struct GoogleDriveAdapter {
    config: GoogleDriveConfig,
    tokens: GoogleTokenManager,
    http_client: reqwest::Client,
}

impl GoogleDriveAdapter {
    pub fn new(config: GoogleDriveConfig) -> Result<Self, StorageError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| StorageError::Backend(format!("Failed to create HTTP client: {}", e)))?;
        let tokens = GoogleTokenManager::new(&config.credentials, http_client.clone())?;

        info!(
            "Google Drive adapter initialized for {} (folder: {})",
            tokens.client_email(),
            config.folder_id.as_deref().map_or_else(
                || format!("{}/{}", config.parent_folder_name, config.folder_name),
                |id| id.to_string()
            )
        );

        Ok(Self {
            config,
            tokens,
            http_client,
        })
    }

    fn file_url(&self, file_id: &str) -> String {
        format!(
            "{}/files/{}",
            self.config.api_base_url,
            urlencoding::encode(file_id)
        )
    }

    /// Folder that receives uploads, resolved per call
    async fn resolve_folder(&self, token: &str) -> Result<String, StorageError> {
        if let Some(folder_id) = &self.config.folder_id {
            self.verify_folder_access(token, folder_id).await?;
            return Ok(folder_id.clone());
        }

        let parent_id = self
            .find_or_create_folder(token, &self.config.parent_folder_name, None)
            .await?;
        self.find_or_create_folder(token, &self.config.folder_name, Some(&parent_id))
            .await
    }

    fn permission_hint(&self, folder: &str) -> String {
        format!(
            "Service account {} cannot upload to Google Drive folder {}. \
             Share the folder with {} and give it Editor access.",
            self.tokens.client_email(),
            folder,
            self.tokens.client_email()
        )
    }

    /// Check that the service account may add files to a configured folder
    async fn verify_folder_access(
        &self,
        token: &str,
        folder_id: &str,
    ) -> Result<(), StorageError> {
        debug!("Checking write access to Drive folder {}", folder_id);

        let response = self
            .http_client
            .get(self.file_url(folder_id))
            .bearer_auth(token)
            .query(&[
                ("fields", "id,name,capabilities(canAddChildren)"),
                ("supportsAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        // Drive reports folders the account cannot see as missing
        if matches!(
            response.status(),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Err(StorageError::Permission(self.permission_hint(folder_id)));
        }

        let folder: FolderMetadata = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(parse_error)?;

        if !folder.capabilities.can_add_children {
            warn!(
                "Drive folder '{}' ({}) is not writable by {}",
                folder.name,
                folder.id,
                self.tokens.client_email()
            );
            return Err(StorageError::Permission(
                self.permission_hint(&format!("'{}' ({})", folder.name, folder.id)),
            ));
        }

        Ok(())
    }

    async fn find_or_create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StorageError> {
        if let Some(existing) = self.find_folder(token, name, parent_id).await? {
            debug!("Using existing Drive folder '{}' ({})", name, existing);
            return Ok(existing);
        }

        let folder_id = self.create_folder(token, name, parent_id).await?;
        self.grant_public_read(token, &folder_id).await?;
        info!("Created Drive folder '{}' ({})", name, folder_id);
        Ok(folder_id)
    }

    async fn find_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let query = folder_query(name, parent_id);

        let response = self
            .http_client
            .get(format!("{}/files", self.config.api_base_url))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("spaces", "drive"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let list: DriveFileList = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(parse_error)?;
        Ok(list.files.into_iter().next().map(|f| f.id))
    }

    async fn create_folder(
        &self,
        token: &str,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<String, StorageError> {
        let mut metadata = json!({
            "name": name,
            "mimeType": DRIVE_FOLDER_MIME_TYPE,
        });
        if let Some(parent_id) = parent_id {
            metadata["parents"] = json!([parent_id]);
        }

        let response = self
            .http_client
            .post(format!("{}/files", self.config.api_base_url))
            .bearer_auth(token)
            .query(&[("fields", "id"), ("supportsAllDrives", "true")])
            .json(&metadata)
            .send()
            .await
            .map_err(transport_error)?;

        let folder: DriveFile = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(parse_error)?;
        Ok(folder.id)
    }

    /// Make a file or folder readable by anyone with the link
    async fn grant_public_read(&self, token: &str, file_id: &str) -> Result<(), StorageError> {
        let response = self
            .http_client
            .post(format!("{}/permissions", self.file_url(file_id)))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")])
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn create_file(
        &self,
        token: &str,
        folder_id: &str,
        blob: &StagedBlob,
    ) -> Result<DriveFile, StorageError> {
        let data = blob
            .read()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to read staged upload: {}", e)))?;

        let metadata = json!({
            "name": blob.original_name(),
            "mimeType": blob.mime_type(),
            "parents": [folder_id],
        });
        let boundary = format!("photo-gateway-{}", Uuid::new_v4().simple());
        let body = related_body(&boundary, &metadata.to_string(), blob.mime_type(), &data);

        let response = self
            .http_client
            .post(format!("{}/files", self.config.upload_base_url))
            .bearer_auth(token)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,name"),
                ("supportsAllDrives", "true"),
            ])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?.json().await.map_err(parse_error)
    }

    async fn delete_file(&self, token: &str, file_id: &str) -> Result<(), StorageError> {
        let response = self
            .http_client
            .delete(self.file_url(file_id))
            .bearer_auth(token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await
            .map_err(transport_error)?;

        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for GoogleDriveAdapter {
    fn name(&self) -> &'static str {
        "google_drive"
    }

    async fn store(&self, blob: &StagedBlob) -> Result<StorageReference, StorageError> {
        let token = self.tokens.access_token().await?;
        let folder_id = self.resolve_folder(&token).await?;

        let file = self.create_file(&token, &folder_id, blob).await?;
        debug!(
            "Created Drive file '{}' ({}) in folder {}",
            file.name, file.id, folder_id
        );

        // The created file is left in place when sharing fails
        if let Err(e) = self.grant_public_read(&token, &file.id).await {
            warn!("Failed to make Drive file {} public: {}", file.id, e);
            return Err(e);
        }

        info!(
            "Uploaded '{}' to Google Drive as {} ({} bytes)",
            blob.original_name(),
            file.id,
            blob.size()
        );

        Ok(StorageReference {
            url: direct_content_url(&file.id),
            file_id: file.id,
        })
    }

    async fn remove(&self, file_id: &str) -> Result<(), StorageError> {
        let token = self.tokens.access_token().await?;
        self.delete_file(&token, file_id).await?;
        info!("Deleted Google Drive file {}", file_id);
        Ok(())
    }
}

/// Drive search query for a non-trashed folder with the given name
fn folder_query(name: &str, parent_id: Option<&str>) -> String {
    let mut query = format!(
        "mimeType='{}' and name='{}' and trashed=false",
        DRIVE_FOLDER_MIME_TYPE,
        escape_query_value(name)
    );
    if let Some(parent_id) = parent_id {
        query.push_str(&format!(" and '{}' in parents", escape_query_value(parent_id)));
    }
    query
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Body of a `multipart/related` upload: JSON metadata followed by the media
fn related_body(boundary: &str, metadata: &str, mime_type: &str, data: &[u8]) -> Vec<u8> {
    let head = format!(
        "--{boundary}\r\n\
         Content-Type: application/json; charset=UTF-8\r\n\r\n\
         {metadata}\r\n\
         --{boundary}\r\n\
         Content-Type: {mime_type}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + data.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(tail.as_bytes());
    body
}

fn transport_error(e: reqwest::Error) -> StorageError {
    error!("Google Drive request failed: {}", e);
    StorageError::Backend(e.to_string())
}

fn parse_error(e: reqwest::Error) -> StorageError {
    error!("Failed to parse Google Drive response: {}", e);
    StorageError::Backend(format!("Unexpected Google Drive response: {}", e))
}

/// Pass successful responses through; turn failures into the provider's message
async fn ensure_success(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<DriveErrorBody>(&body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("Google Drive returned HTTP {}: {}", status, body));

    error!("Google Drive error (HTTP {}): {}", status, message);
    Err(StorageError::Backend(message))
}
